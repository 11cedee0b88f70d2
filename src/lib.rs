/*!
# Echo Rust

A client library for the Echo blockchain, a Graphene-family chain with accounts, user-issued
assets and smart contracts.

It covers what a client needs to talk to a node:

- the canonical binary encoding transactions are signed over, and the JSON form the node speaks
- keys derived from an account name and password, addresses, WIF, and memo encryption
- operations, transactions and signing
- a websocket RPC client that multiplexes calls over one connection and delivers object-change
  notices to subscribers

# Usage

```no_run
use echo_rust::crypto::Role;
use echo_rust::keypair::Keypair;
use echo_rust::networking::client::EchoClient;
use echo_rust::operations::TransferOperationBuilder;
use echo_rust::asset::{AssetAmount, ECHO_ASSET_ID};
use echo_rust::object::ObjectId;
use echo_rust::settings::ClientSettings;

# async fn run() -> echo_rust::Result<()> {
let client = EchoClient::new(ClientSettings::load("config/echo")?);
client.connect().await?;

let transfer = TransferOperationBuilder::new()
    .set_from(ObjectId::account(17))
    .set_to(ObjectId::account(18))
    .set_amount(AssetAmount::new(1000, ECHO_ASSET_ID))
    .build()?;

let mut transaction = client.prepare_transaction(vec![transfer.into()]).await?;
client.fill_required_fees(&mut transaction, ECHO_ASSET_ID).await?;
transaction.add_private_key(Keypair::from_credentials("nathan", "password", Role::Active)?.private_key());
transaction.sign()?;
client.broadcast_transaction(&transaction).await?;
# Ok(())
# }
```

*/
pub mod address;
pub mod asset;
pub mod authority;
pub mod block;
pub mod crypto;
pub mod error;
pub mod history;
pub mod keypair;
pub mod memo;
pub mod networking;
pub mod object;
pub mod operations;
pub mod serialize;
pub mod settings;
pub mod time;
pub mod transaction;

#[cfg(test)]
pub mod test_utilities;

pub use error::{EchoError, Result};
