use std::fmt;

/// 图内标识符，数字或字符串；排序时数字在前，各按自然序
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Id {
    Num(u64),
    Str(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(num) => write!(f, "{num}"),
            Self::Str(str) => f.write_str(str),
        }
    }
}

macro_rules! impl_from {
    ($( $ty:ty => $variant:ident )+) => {
        $(
            impl From<$ty> for Id {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

impl_from! {
    u64     => Num
    u32     => Num
    &str    => Str
    String  => Str
}

impl From<usize> for Id {
    fn from(value: usize) -> Self {
        Self::Num(value as _)
    }
}

macro_rules! impl_id {
    ($( $ty:ident )+) => {
        $(
            /// 不透明标识符；张量和算子各占独立的 id 空间
            #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
            #[repr(transparent)]
            pub struct $ty(pub Id);

            impl<T> From<T> for $ty
            where
                Id: From<T>,
            {
                fn from(value: T) -> Self {
                    Self(value.into())
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

impl_id! { TensorId OperatorId }
