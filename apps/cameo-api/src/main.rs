use clap::Parser;

use cameo_api::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	cameo_api::run(args).await
}
