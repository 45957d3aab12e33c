use clap::Parser;
use log::info;
use msq::{human_readable_name, Conf, MsqErr};
use serde::Serialize;
use serde_json::Value;
use std::{process::ExitCode, time::Duration};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Query a Minecraft server over the Query protocol",
    long_about = None
)]
struct Args {
    /// Server host name or IP address
    host: String,

    /// Server query port
    #[arg(default_value = "25565")]
    port: u16,

    /// Socket timeout in seconds
    #[arg(short = 't', long, default_value = "2")]
    timeout: u64,

    /// Session id sent with every request
    #[arg(short = 's', long, default_value = "0")]
    session_id: i32,

    /// Retry budget for handshakes and full status queries
    #[arg(short = 'r', long, default_value = "2")]
    retries: u32,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    match run(&Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), MsqErr> {
    let conf = Conf::create_with_port(&args.host, args.port)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_session_id(args.session_id)
        .with_max_retries(args.retries);

    info!("Querying {}", conf);
    let mut client = conf.create_client()?;

    println!("Basic info:");
    print_status(&client.query()?, args.json)?;

    println!("Full info:");
    print_status(&client.query_full()?, args.json)?;

    info!(
        "Session ping {}ms, retries {}",
        client.session().ping(),
        client.session().retries()
    );

    Ok(())
}

fn error_message(err: &MsqErr) -> String {
    format!("error: {}", err)
}

fn print_status<S: Serialize>(status: &S, json: bool) -> Result<(), MsqErr> {
    let value = serde_json::to_value(status).map_err(|err| MsqErr::DataErr(err.to_string()))?;

    match json {
        true => println!("{:#}", value),
        false => print_value(&value, 1),
    }

    Ok(())
}

fn print_value(value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);

    match value {
        Value::Object(map) => {
            for (key, value) in map {
                let label = human_readable_name(key).unwrap_or(key.as_str());

                match value {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}{}:", indent, label);
                        print_value(value, depth + 1);
                    }
                    _ => println!("{}{}: {}", indent, label, scalar(value)),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                println!("{}- {}", indent, scalar(item));
            }
        }
        _ => println!("{}{}", indent, scalar(value)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(str) => str.clone(),
        Value::Null => "(none)".into(),
        other => other.to_string(),
    }
}
