use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{event, Level};

use crate::error::{EchoError, Result};
use crate::networking::socket::SocketCore;

/// Open a websocket to `url` and wire it to `core`.
///
/// Returns once the socket is connected. Two tasks keep running afterwards: a writer that drains
/// the outbound queue into the socket, and a reader that hands every text frame to
/// [`SocketCore::on_message`] and reports the socket closing.
pub async fn open(core: Arc<SocketCore>, url: &str) -> Result<()> {
    let url = url::Url::parse(url).map_err(|error| EchoError::Connection(format!("bad url `{}`: {}", url, error)))?;
    let generation = core.begin_connect().await?;

    let ws_stream = match connect_async(url.clone()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(error) => {
            core.on_failure(generation, &error.to_string()).await;
            return Err(EchoError::Connection(format!("could not connect to {}: {}", url, error)));
        }
    };
    event!(Level::INFO, "websocket open to {}", url);

    let (write_sink, mut read_stream) = ws_stream.split();
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel();
    let outbound_receiver = UnboundedReceiverStream::new(outbound_receiver);
    tokio::task::spawn(outbound_receiver.forward(write_sink).map(|result| {
        if let Err(error) = result {
            event!(Level::ERROR, "error sending websocket msg: {}", error);
        }
    }));

    core.on_connected(generation, outbound_sender).await;

    let reader_core = core.clone();
    tokio::task::spawn(async move {
        while let Some(result) = read_stream.next().await {
            match result {
                Ok(Message::Text(text)) => reader_core.on_message(&text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(error) => {
                    reader_core.on_failure(generation, &error.to_string()).await;
                    return;
                }
            }
        }
        reader_core.on_disconnected(generation, "socket closed by peer").await;
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networking::socket::SocketState;
    use crate::networking::socket_operation::GetChainId;
    use crate::test_utilities::mocks::FakeNode;
    use std::time::Duration;

    #[tokio::test]
    async fn open_and_call_through_websocket_test() {
        let node = FakeNode::start().await;
        let core = Arc::new(SocketCore::new());
        open(core.clone(), &node.url()).await.unwrap();
        assert_eq!(core.state().await, SocketState::Connected);

        let chain_id = core
            .call(GetChainId, 2, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(chain_id, crate::test_utilities::mocks::CHAIN_ID);
        core.disconnect().await;
        assert_eq!(core.state().await, SocketState::Disconnected);
    }

    #[tokio::test]
    async fn failed_connect_returns_to_disconnected_test() {
        let core = Arc::new(SocketCore::new());
        let result = open(core.clone(), "ws://127.0.0.1:1").await;
        assert!(matches!(result, Err(EchoError::Connection(_))));
        assert_eq!(core.state().await, SocketState::Disconnected);
        assert!(open(core.clone(), "not a url").await.is_err());
    }

    #[tokio::test]
    async fn server_close_fails_pending_calls_test() {
        let node = FakeNode::start().await;
        let core = Arc::new(SocketCore::new());
        open(core.clone(), &node.url()).await.unwrap();

        let silent = core.emit(GetChainId, FakeNode::SILENT_API_ID).await.unwrap();
        node.drop_connections();
        let result = core.wait(silent, Some(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(EchoError::Connection(_))));
        assert_eq!(core.state().await, SocketState::Disconnected);
    }
}
