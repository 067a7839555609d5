use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = trawl::Args::parse();
	trawl::run(args).await
}
