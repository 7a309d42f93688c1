//! `ptp-calc` - submit one calculation from the command line
//!
//! ```text
//! ptp-calc <calculator> <metric|imperial> key=value...
//! ptp-calc displacement metric bore=64 stroke=54 cylinders=1
//! ptp-calc tires metric vehicle_type=LightTruck rim_in=16 flotation=31x10.5R16
//! ```
//!
//! Nested inputs use dotted keys (`compression.chamber_volume=12`).
//! `PTP_API_BASE` and `PTP_TIMEOUT_MS` configure the client, `RUST_LOG` the
//! log filter and `LOG_FORMAT=json` switches to JSON logs.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ptp_calc_core::client::RequestClient;
use ptp_calc_core::config::ClientConfig;
use ptp_calc_core::model::CalcRequest;
use ptp_calc_core::units::parse_decimal;
use ptp_calc_core::{Calculator, UnitSystem};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// `"64"` → number, `"64,5"` → number, anything else → string
fn input_value(text: &str) -> Value {
    parse_decimal(text)
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}

fn insert_path(inputs: &mut Map<String, Value>, key: &str, value: Value) -> Result<()> {
    match key.split_once('.') {
        None => {
            inputs.insert(key.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = inputs
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(nested) = entry else {
                bail!("'{}' is both a value and a group", head);
            };
            insert_path(nested, rest, value)?;
        }
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<CalcRequest> {
    let [calculator, unit_system, pairs @ ..] = args else {
        bail!("usage: ptp-calc <calculator> <metric|imperial> key=value...");
    };
    let calculator: Calculator = calculator.parse().map_err(anyhow::Error::msg)?;
    let unit_system: UnitSystem = unit_system.parse().map_err(anyhow::Error::msg)?;

    let mut inputs = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{}'", pair))?;
        insert_path(&mut inputs, key.trim(), input_value(value.trim()))?;
    }

    let mut builder = CalcRequest::builder(calculator, unit_system);
    for (key, value) in inputs {
        builder = builder.value(&key, value);
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = parse_args(&args)?;
    let config = ClientConfig::from_env()?;
    info!(base_url = %config.base_url, calculator = %request.calculator(), "Submitting");

    let client = RequestClient::from_config(&config)?;
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, cancelling");
            on_ctrl_c.cancel();
        }
    });

    match client.submit(&request, &cancel).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            if let Some(fields) = err.field_errors() {
                for (field, reason) in fields.iter() {
                    eprintln!("  {}: {}", field, reason);
                }
            }
            if let Some(hint) = err.retry_hint() {
                eprintln!("{}", hint);
            }
            Err(err.into())
        }
    }
}
