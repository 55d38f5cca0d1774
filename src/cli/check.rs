//! Check command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::graph::backends::neo4j::Neo4jClient;
use crate::graph::QueryExt;

use super::App;

impl App {
    /// Connects with the layered configuration and runs `RETURN 1`.
    pub async fn run_check(&self) -> Result<()> {
        let config = Config::load()?;
        let client = Neo4jClient::from_config(&config.neo4j)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        let ok: i64 = client
            .query("RETURN 1 AS ok")
            .fetch_one()
            .await?
            .ok_or_else(|| color_eyre::eyre::eyre!("Server returned no rows"))?
            .get("ok")?;

        tracing::info!("Server at {} answered {}", config.neo4j.uri, ok);
        println!("ok: {}", config.neo4j.uri);
        Ok(())
    }
}
