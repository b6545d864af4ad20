/// UUID ベースの ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`Uuid` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `from_uuid()`: 既存 UUID から復元
/// - `parse_str()`: 文字列から復元（不正な値は `None`）
/// - `as_uuid()`: 内部 UUID への参照
///
/// ID は常に上流（プロフィールストア）で採番されるため、`new()` は生成しない。
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 既存の UUID から ID を作成する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// 文字列から ID を作成する
            ///
            /// 空文字列や UUID として解釈できない値は `None` を返す。
            pub fn parse_str(value: &str) -> Option<Self> {
                uuid::Uuid::parse_str(value.trim()).ok().map(Self)
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }
    };
}
