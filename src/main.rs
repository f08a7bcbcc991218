use clap::Parser;
use food_recipe::{cli, config, error, preview, render, selection, state, upload};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use food_recipe_common::{display_food_name, KNOWN_FOODS};
use preview::TempPreviewStore;
use selection::SelectedFile;
use state::{UploadPhase, UploadStateMachine};
use tracing_subscriber::EnvFilter;
use std::process::ExitCode;
use upload::{HttpTransport, UploadClient};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(url) = &cli.server_url {
        config.server_url = url.clone();
    }

    match cli.command {
        Commands::Predict { image, json } => {
            println!("📸 food-recipe - 料理写真解析\n");

            let mut machine = UploadStateMachine::new(TempPreviewStore::new()?);
            machine.select(Some(SelectedFile::from_path(&image)?))?;
            if let Some(url) = &machine.state().preview_url {
                println!("- プレビュー: {}", url);
            }

            println!("- 送信中... ({})", config.server_url);
            let client = UploadClient::new(HttpTransport::new(&config)?);
            machine.upload(&client).await;

            if !print_result(machine.state(), json)? {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Info { food, json } => {
            println!("📖 food-recipe - レシピ検索\n");

            if !KNOWN_FOODS.contains(&food.as_str()) {
                println!("- 注意: '{}' は認識対象の料理ではありません", food);
            }

            let mut machine = UploadStateMachine::new(TempPreviewStore::new()?);
            let client = UploadClient::new(HttpTransport::new(&config)?);
            machine.lookup(&client, &food).await;

            if !print_result(machine.state(), json)? {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Foods => {
            for food in KNOWN_FOODS {
                println!("{:<16} {}", food, display_food_name(food));
            }
        }

        Commands::Config { set_server_url, show } => {
            if let Some(url) = set_server_url {
                config.set_server_url(url)?;
                println!("✔ サーバーURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  サーバーURL: {}", config.server_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

/// 結果を表示し、成功なら `true` を返す
fn print_result(state: &state::UploadState, json: bool) -> Result<bool> {
    if json {
        if let Some(recipe) = &state.recipe {
            println!("{}", serde_json::to_string_pretty(recipe)?);
        }
        if let Some(error) = &state.error {
            eprintln!("{}", error);
        }
    } else {
        print!("{}", render::render_state(state));
    }

    Ok(state.phase != UploadPhase::Failed)
}
