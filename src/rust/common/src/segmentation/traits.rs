//! セグメンタートレイト定義

use crate::error::Result;
use async_trait::async_trait;

/// 背景除去の外部コラボレーター
///
/// 入力はPNGエンコード済み画像、出力は背景を透過化した画像（通常は
/// アルファチャンネル付きPNG）。呼び出しはリクエストごとに1回のみ、
/// リトライは行わない。
#[async_trait]
pub trait Segmenter: Send + Sync + 'static {
    /// 背景除去を実行する
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>>;

    /// 実装名（ヘルスチェック表示用）
    fn name(&self) -> &str;
}
