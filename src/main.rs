use clap::Parser;
use quoteposter::config::{build_pipeline, setup_logging};
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = quoteposter::cli::CliOptions::parse();

    let _ = setup_logging(cli.debug);

    let pipeline = match build_pipeline(&cli.service).await {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("Startup error: {}", err);
            return;
        }
    };

    if let Err(err) = quoteposter::web::setup_server(
        &cli.listen_address,
        cli.port,
        pipeline,
        &cli.service.output_dir,
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
