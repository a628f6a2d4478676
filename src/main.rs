use rpc_gateway::{config::ServerConfig, logging, Fault, HandlerRegistry, RpcServer};
use serde_json::{json, Value};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = ServerConfig::from_env()?;
    let registry = HandlerRegistry::new();
    registry.register_fn("add", |params: Vec<Value>| async move { add(&params) })?;
    registry.register_fn("echo", |params: Vec<Value>| async move {
        Ok::<_, Fault>(Value::Array(params))
    })?;

    let server = RpcServer::new(config, registry);
    let local_addr = server.start().await?;
    info!(
        local_addr = %local_addr,
        methods = ?server.registry().method_names(),
        "server started, press ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    server.stop().await?;
    Ok(())
}

fn add(params: &[Value]) -> Result<Value, Fault> {
    if let Some(sum) = params
        .iter()
        .try_fold(0i64, |acc, value| value.as_i64().and_then(|n| acc.checked_add(n)))
    {
        return Ok(json!(sum));
    }

    params
        .iter()
        .map(Value::as_f64)
        .sum::<Option<f64>>()
        .map(|sum| json!(sum))
        .ok_or_else(|| Fault::new(3, "add expects numeric params"))
}
