use anyhow::{anyhow, Context};
use chrono::Utc;
use chrono_tz::Tz;
use slog::{info, Logger};
use std::sync::Arc;
use tempo::{
    get_config_info, local_day, local_hour, parse_report_time, setup_logger, AemetClient,
    Assistant, Cli, Command, DailyReports, ForecastService, LogSink, PlaceDirectory, ReportSink,
    WebhookSink,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = setup_logger(&cli);

    let timezone: Tz = cli
        .timezone()
        .parse()
        .map_err(|e| anyhow!("invalid timezone {}: {}", cli.timezone(), e))?;

    info!(logger, "tempo starting...");
    info!(logger, "  Config: {}", cli.config_source());
    info!(logger, "  AEMET: {}", cli.base_url());
    info!(logger, "  Timezone: {}", timezone);

    let places = PlaceDirectory::load(logger.clone(), &cli.datasets(), &cli.config_source())
        .context("failed to load place datasets")?;
    let source = AemetClient::new(logger.clone(), &cli.base_url(), cli.request_timeout())
        .context("failed to build AEMET client")?;
    let forecasts = ForecastService::new(logger.clone(), Arc::new(source));
    let assistant = Arc::new(Assistant::new(
        logger.clone(),
        places,
        forecasts,
        cli.render_options(),
    ));

    let command = cli.command.clone().unwrap_or(Command::Serve);
    match command {
        Command::Today { place } => {
            let now = Utc::now();
            let date = local_day(now, timezone, 0)?;
            let outcome = assistant
                .hourly_report(&place.join(" "), date, local_hour(now, timezone))
                .await?;
            println!("{}", outcome.text());
        }
        Command::Tomorrow { place } => {
            let date = local_day(Utc::now(), timezone, 1)?;
            let outcome = assistant.daily_report(&place.join(" "), date).await?;
            println!("{}", outcome.text());
        }
        Command::Serve => serve(&cli, logger, assistant, timezone).await?,
    }
    Ok(())
}

async fn serve(
    cli: &Cli,
    logger: Logger,
    assistant: Arc<Assistant>,
    timezone: Tz,
) -> Result<(), anyhow::Error> {
    let report_time = parse_report_time(&cli.report_time())
        .with_context(|| format!("invalid report time {}", cli.report_time()))?;
    let sink: Arc<dyn ReportSink> = match cli.webhook_url.as_deref() {
        Some(url) => Arc::new(
            WebhookSink::new(logger.clone(), url, cli.request_timeout())
                .context("failed to build webhook client")?,
        ),
        None => Arc::new(LogSink::new(logger.clone())),
    };

    info!(logger, "  Report time: {}", report_time);
    info!(logger, "  Subscriptions: {}", cli.subscriptions.len());

    let reports = DailyReports::new(
        logger,
        assistant,
        sink,
        cli.subscriptions.clone(),
        report_time,
        timezone,
    );
    reports.run(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
