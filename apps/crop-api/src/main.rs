use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = crop_api::Args::parse();

	crop_api::run(args).await
}
