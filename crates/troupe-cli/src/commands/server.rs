//! `troupe server` — Start the troupe HTTP backend server.

pub async fn run(host: String, port: u16, db_path: String) -> Result<(), String> {
    let config = troupe_server::ServerConfig {
        host: host.clone(),
        port,
        db_path,
        ..Default::default()
    };

    println!("Starting troupe server on {}:{}...", host, port);

    let addr = troupe_server::start_server(config).await?;
    println!("troupe server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
