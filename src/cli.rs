use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "food-recipe")]
#[command(about = "料理写真からレシピ・カロリー・栄養情報を取得するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 予測サーバーのURL（設定ファイルより優先）
    #[arg(long, global = true)]
    pub server_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 料理写真をアップロードしてレシピを表示
    Predict {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 正規化済みレシピをJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 料理名からレシピ情報を取得
    Info {
        /// 料理名（例: ayam_pop）
        #[arg(required = true)]
        food: String,

        /// 正規化済みレシピをJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 認識可能な料理の一覧
    Foods,

    /// 設定管理
    Config {
        /// 予測サーバーのURLを設定
        #[arg(long)]
        set_server_url: Option<String>,

        /// 現在の設定を表示
        #[arg(long)]
        show: bool,
    },
}
