//! Error handling for the release workflow
//!
//! Every fatal condition of a run is a `ReleaseError`. The absence of a
//! previous release is not an error and is modelled by
//! [`LatestRelease`](crate::core::traits::LatestRelease) instead.

use crate::security::command_executor::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for release and deployment operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    // Configuration errors
    #[error("設定エラー: {0}")]
    ConfigError(String),

    #[error("入力 '{name}' の値が不正です: {value}")]
    InvalidInput { name: String, value: String },

    #[error("リポジトリ指定が不正です（owner/repo 形式が必要）: {0}")]
    InvalidRepository(String),

    #[error("リポジトリが設定されていません（GITHUB_REPOSITORY）")]
    RepositoryMissing,

    #[error("認証トークンが設定されていません（GITHUB_TOKEN）")]
    TokenMissing,

    // Manifest errors
    #[error("マニフェストが見つかりません: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("マニフェストの解析に失敗しました: {}: {message}", path.display())]
    ManifestInvalid { path: PathBuf, message: String },

    // Hosting API errors
    #[error("APIリクエストが失敗しました（HTTP {status}）: {message}")]
    ApiError { status: u16, message: String },

    #[error("ネットワークエラーが発生しました: {0}")]
    NetworkError(String),

    // Deployment errors
    #[error("[{deploy_type}] クラウド認証情報が設定されていません")]
    CredentialsMissing { deploy_type: String },

    #[error(transparent)]
    Command(#[from] CommandError),

    // Runtime errors
    #[error("ランナーファイルへの書き込みに失敗しました: {}: {message}", path.display())]
    RuntimeFileError { path: PathBuf, message: String },

    #[error("不正な状態遷移です: {from} → {to}")]
    InvalidStateTransition { from: String, to: String },
}

impl ReleaseError {
    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::ConfigError(_) => vec![".release-config.yaml の内容を確認してください"],
            Self::InvalidInput { .. } => vec![
                "ワークフローの with: 入力値を確認してください",
                "真偽値は true / false で指定してください",
            ],
            Self::InvalidRepository(_) | Self::RepositoryMissing => {
                vec!["GITHUB_REPOSITORY が owner/repo 形式で設定されているか確認してください"]
            }
            Self::TokenMissing => vec!["env: に GITHUB_TOKEN を渡してください"],
            Self::ManifestNotFound { .. } => vec![
                "actions/checkout が実行されているか確認してください",
                "manifest 入力でマニフェストのパスを指定できます",
            ],
            Self::ManifestInvalid { .. } => {
                vec!["package.json/Cargo.toml の version フィールドを確認してください"]
            }
            Self::ApiError { .. } => vec![
                "トークンの権限（contents: write）を確認してください",
                "同名のタグが既に存在しないか確認してください",
            ],
            Self::NetworkError(_) => vec!["ネットワーク接続を確認してください"],
            Self::CredentialsMissing { .. } => vec![
                "awsKey / awsSecret 入力を設定してください",
                "または AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY を環境変数で渡してください",
            ],
            Self::Command(_) => vec![
                "コマンドの出力を確認してください",
                "必要なツールがランナーにインストールされているか確認してください",
            ],
            Self::RuntimeFileError { .. } => {
                vec!["GITHUB_ENV / GITHUB_OUTPUT のパスを確認してください"]
            }
            Self::InvalidStateTransition { .. } => vec!["不具合として報告してください"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidRepository(_) => "INVALID_REPOSITORY",
            Self::RepositoryMissing => "REPOSITORY_MISSING",
            Self::TokenMissing => "TOKEN_MISSING",
            Self::ManifestNotFound { .. } => "MANIFEST_NOT_FOUND",
            Self::ManifestInvalid { .. } => "MANIFEST_INVALID",
            Self::ApiError { .. } => "API_ERROR",
            Self::NetworkError(_) => "NETWORK_ERROR",
            Self::CredentialsMissing { .. } => "CREDENTIALS_MISSING",
            Self::Command(_) => "COMMAND_ERROR",
            Self::RuntimeFileError { .. } => "RUNTIME_FILE_ERROR",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
        }
    }
}

impl From<reqwest::Error> for ReleaseError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::ApiError {
                status: status.as_u16(),
                message: error.to_string(),
            },
            None => Self::NetworkError(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_not_found_error() {
        let error = ReleaseError::ManifestNotFound {
            path: PathBuf::from("/workspace/package.json"),
        };

        assert_eq!(error.code(), "MANIFEST_NOT_FOUND");
        assert!(error.to_string().contains("/workspace/package.json"));
        assert_eq!(error.suggested_actions().len(), 2);
    }

    #[test]
    fn test_api_error_with_status() {
        let error = ReleaseError::ApiError {
            status: 422,
            message: "Validation Failed".to_string(),
        };

        assert_eq!(error.code(), "API_ERROR");
        let message = error.to_string();
        assert!(message.contains("422"));
        assert!(message.contains("Validation Failed"));
    }

    #[test]
    fn test_credentials_missing_error() {
        let error = ReleaseError::CredentialsMissing {
            deploy_type: "service".to_string(),
        };

        assert_eq!(error.code(), "CREDENTIALS_MISSING");
        assert!(error.to_string().contains("[service]"));
        assert!(
            error
                .suggested_actions()
                .iter()
                .any(|a| a.contains("AWS_ACCESS_KEY_ID"))
        );
    }

    #[test]
    fn test_command_error_is_transparent() {
        let error: ReleaseError = CommandError::CommandNotAllowed("rm".to_string()).into();

        assert_eq!(error.code(), "COMMAND_ERROR");
        assert_eq!(
            error.to_string(),
            "Command 'rm' is not in the allowed whitelist"
        );
    }

    #[test]
    fn test_invalid_input_error() {
        let error = ReleaseError::InvalidInput {
            name: "release".to_string(),
            value: "yes".to_string(),
        };

        assert_eq!(error.code(), "INVALID_INPUT");
        assert!(error.to_string().contains("'release'"));
        assert!(error.to_string().contains("yes"));
    }
}
