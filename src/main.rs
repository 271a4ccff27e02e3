use anyhow::{Context, Result};
use clap::Parser;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use lp_agent::{
    cli::Cli,
    config::AppConfig,
    dex::EthersChain,
    errors::AppError,
    execution::TradeExecutor,
    orchestrator::{Orchestrator, StopFlag},
    sizing::SizingConfig,
    store::StateStore,
    utils,
};
use secrecy::ExposeSecret;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    utils::init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(AppError::Config(msg)) => {
                    tracing::error!(%msg, "[INIT] invalid configuration")
                }
                _ => tracing::error!(error = ?e, "[INIT] startup failed"),
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_lookup(|key| {
        cli.env_override(key)
            .or_else(|| std::env::var(key).ok())
    })?;

    let stop_flag = StopFlag::new(&config.stop_flag);
    if stop_flag.is_raised().await {
        tracing::info!(path = %stop_flag.path().display(), "[STOP] stop flag detected, exiting");
        return Ok(());
    }

    tracing::info!(
        token = ?config.token,
        router = ?config.router,
        factory = ?config.factory,
        wrapped_native = ?config.wrapped_native,
        profit_recipient = ?config.profit_recipient,
        dry_run = config.dry_run,
        "[INIT] lp-agent starting"
    );

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .map_err(|e| AppError::Config(format!("RPC_URL rejected by provider: {e}")))?;

    let wallet = match &config.private_key {
        Some(key) => {
            let raw = key.expose_secret();
            let raw = raw.strip_prefix("0x").unwrap_or(raw);
            Some(
                raw.parse::<LocalWallet>()
                    .map_err(|e| AppError::Config(format!("PRIVATE_KEY is invalid: {e}")))?,
            )
        }
        None => None,
    };
    let address = resolve_address(wallet.as_ref(), config.bot_address)?;
    tracing::info!(wallet = ?address, "[INIT] wallet resolved");

    match wallet {
        Some(wallet) if !config.dry_run => {
            let chain_id = provider
                .get_chainid()
                .await
                .context("failed to query chain id")?;
            let signer = wallet.with_chain_id(chain_id.as_u64());
            let client = Arc::new(SignerMiddleware::new(provider, signer));
            launch(client, address, &config, &cli, stop_flag).await
        }
        _ => launch(Arc::new(provider), address, &config, &cli, stop_flag).await,
    }
}

fn resolve_address(wallet: Option<&LocalWallet>, bot_address: Option<Address>) -> Result<Address> {
    match (wallet.map(|w| w.address()), bot_address) {
        (Some(derived), Some(configured)) if derived != configured => {
            tracing::warn!(
                ?derived,
                ?configured,
                "[INIT] BOT_ADDRESS differs from the key's address, using the key"
            );
            Ok(derived)
        }
        (Some(derived), _) => Ok(derived),
        (None, Some(configured)) => Ok(configured),
        (None, None) => Err(AppError::Config("no wallet address available".into()).into()),
    }
}

async fn launch<M: Middleware + 'static>(
    client: Arc<M>,
    address: Address,
    config: &AppConfig,
    cli: &Cli,
    stop_flag: StopFlag,
) -> Result<()> {
    let chain = Arc::new(EthersChain::new(client, address, config));
    let executor = TradeExecutor::new(chain.clone(), config.dry_run);
    let orchestrator = Orchestrator::new(
        chain,
        executor,
        StateStore::new(&config.state_file),
        stop_flag,
        SizingConfig::default(),
    );
    orchestrator.run(config.interval, cli.once).await;
    tracing::info!("[CYCLE] agent stopped");
    Ok(())
}
