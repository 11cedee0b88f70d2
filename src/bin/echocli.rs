/*!
# Echo Command Line Interface

Derive keys from account credentials and watch objects on a node.

## Usage

```bash
cargo run --bin echocli -- keys --name nathan --password secret --role active
```
or
```bash
cargo run --bin echocli -- keys --name nathan --password secret --config config/echo
```
or
```bash
cargo run --bin echocli -- watch --config config/echo 1.2.22 2.1.0
```

Log verbosity follows `RUST_LOG`, e.g. `RUST_LOG=echo_rust=debug`.
*/
use std::sync::Arc;

use clap::{App, Arg, SubCommand};
use echo_rust::{
    address::Network,
    crypto::Role,
    keypair::{EdKeypair, Keypair},
    networking::{client::EchoClient, subscription::ObjectListener},
    object::{GrapheneObject, ObjectId},
    settings::ClientSettings,
    EchoError,
};
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

struct LoggingListener;

impl ObjectListener for LoggingListener {
    fn on_update(&self, object: &GrapheneObject) {
        event!(Level::INFO, "{} changed: {}", object.id(), object.data());
    }
}

#[tokio::main]
pub async fn main() -> echo_rust::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let command_matches = App::new("Echo Command Line Interface")
        .about("Derive Echo keys and watch chain objects from the command line")
        .subcommand(
            SubCommand::with_name("keys")
                .about("prints the keys derived from an account name and password")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .required(true)
                        .takes_value(true)
                        .help("account name"),
                )
                .arg(
                    Arg::with_name("password")
                        .short("p")
                        .long("password")
                        .required(true)
                        .takes_value(true)
                        .help("account password"),
                )
                .arg(
                    Arg::with_name("role")
                        .short("r")
                        .long("role")
                        .takes_value(true)
                        .default_value("active")
                        .help("owner, active or memo"),
                )
                .arg(
                    Arg::with_name("prefix")
                        .long("prefix")
                        .takes_value(true)
                        .help("address prefix, ECHO by default"),
                )
                .arg(
                    Arg::with_name("config")
                        .short("c")
                        .long("config")
                        .takes_value(true)
                        .conflicts_with("prefix")
                        .help("take the address prefix from these client settings"),
                ),
        )
        .subcommand(
            SubCommand::with_name("watch")
                .about("subscribes to objects and logs every change until interrupted")
                .arg(
                    Arg::with_name("config")
                        .short("c")
                        .long("config")
                        .takes_value(true)
                        .default_value("config/echo")
                        .help("path to the client settings"),
                )
                .arg(
                    Arg::with_name("ids")
                        .required(true)
                        .multiple(true)
                        .help("object ids, e.g. 1.2.22"),
                ),
        )
        .get_matches();

    if let Some(matches) = command_matches.subcommand_matches("keys") {
        let name = matches.value_of("name").unwrap_or_default();
        let password = matches.value_of("password").unwrap_or_default();
        let role: Role = matches.value_of("role").unwrap_or("active").parse()?;
        let network = match (matches.value_of("prefix"), matches.value_of("config")) {
            (Some(prefix), _) => Network::new(prefix),
            (None, Some(config)) => ClientSettings::load(config)?.network(),
            (None, None) => Network::default(),
        };

        let keypair = Keypair::from_credentials(name, password, role)?;
        let ed_keypair = EdKeypair::from_credentials(name, password, role);
        let echorand = EdKeypair::echorand(name, password);

        println!("address : {}", keypair.address(&network));
        println!("eddsa address : {}", ed_keypair.address());
        println!("echorand address : {}", echorand.address());
        println!("wif : {}", keypair.to_wif());
    }

    if let Some(matches) = command_matches.subcommand_matches("watch") {
        let settings = ClientSettings::load(matches.value_of("config").unwrap_or("config/echo"))?;
        let ids = matches
            .values_of("ids")
            .map(|values| values.map(str::parse::<ObjectId>).collect::<echo_rust::Result<Vec<_>>>())
            .unwrap_or_else(|| Ok(vec![]))?;

        let client = EchoClient::new(settings);
        client.connect().await?;
        client.subscribe_objects(&ids, Arc::new(LoggingListener)).await?;
        event!(
            Level::INFO,
            "watching {} objects on {} ({} addresses), ctrl-c to stop",
            ids.len(),
            client.settings().url,
            client.network().address_prefix()
        );

        tokio::signal::ctrl_c()
            .await
            .map_err(|err| EchoError::Connection(err.to_string()))?;
        client.disconnect().await;
    }

    Ok(())
}
