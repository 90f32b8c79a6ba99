//! Model listing.

use anyhow::Result;
use comfy_table::{ContentArrangement, Table};
use pseudo_core::api::ApiClient;

pub async fn list(client: &ApiClient) -> Result<()> {
    let models = client.list_models().await?;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Model", "Source"]);
    for option in &models {
        table.add_row([option.model.clone(), option.source_label()]);
    }
    println!("{table}");
    Ok(())
}
