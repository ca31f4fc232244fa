//! `orca dirs`: list the directories the backend offers.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use orca_client::{Bootstrap, ClientConfig};
use orca_protocol::DirectoryInfo;

pub async fn run(config: &ClientConfig) -> anyhow::Result<()> {
    let mut bootstrap = Bootstrap::connect(&config.server_url)?;
    let directories = bootstrap
        .wait_for_catalog(Some(config.request_timeout))
        .await?
        .to_vec();
    bootstrap.close();

    println!();
    if directories.is_empty() {
        println!("  No directories offered by {}", config.server_url);
    } else {
        println!("{}", directory_table(&directories));
    }
    println!();
    Ok(())
}

/// Numbered table, 1-based, in server order.
pub fn directory_table(directories: &[DirectoryInfo]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Name", "Path"]);
    for (index, dir) in directories.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            dir.name.clone(),
            dir.path.clone(),
        ]);
    }
    table
}
