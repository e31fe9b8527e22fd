//! 背景除去（セグメンテーション）モジュール
//!
//! モデル本体は外部コラボレーターとして扱い、トレイト越しに呼び出す。
//! 具体実装はサーバークレート側（サイドカーHTTP呼び出し）にある。

pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use traits::Segmenter;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockSegmenter;
