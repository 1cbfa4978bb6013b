//! Port error enum generator.
//!
//! Every ledger port reports failures as a small enum whose variants carry a
//! single detail field. The macro derives `thiserror::Error` and adds a
//! snake-case constructor per variant that accepts anything convertible into
//! the field type, so adapters can write `LedgerRepositoryError::query(err)`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $field:ident : $ty:ty } => $message:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $field: $ty },
            )+
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = "Build the `" $variant "` variant."]
                    pub fn [<$variant:snake>]($field: impl Into<$ty>) -> Self {
                        Self::$variant { $field: $field.into() }
                    }
                }
            )+
        }
    };
}

pub(crate) use define_port_error;
