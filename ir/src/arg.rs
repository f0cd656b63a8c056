use std::collections::HashMap;

/// 算子附加参数；内容由具体算子种类约定，图本身不解释
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(u64),
    Float(f64),
    Str(String),
    Arr(Box<[Self]>),
    Dict(HashMap<String, Self>),
}

macro_rules! impl_from {
    ($( $ty:ty => $variant:ident )+) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

impl_from! {
    bool => Bool
    u64  => Int
    f64  => Float
    String => Str
        Box<       [Self]> => Arr
    HashMap<String, Self > => Dict
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl Arg {
    pub fn bool(value: bool) -> Self {
        value.into()
    }

    pub fn int(value: usize) -> Self {
        (value as u64).into()
    }

    pub fn float(value: f64) -> Self {
        value.into()
    }

    pub fn str(value: impl ToString) -> Self {
        Self::Str(value.to_string())
    }

    pub fn arr(value: impl IntoIterator<Item = Self>) -> Self {
        Self::Arr(value.into_iter().collect())
    }

    pub fn dict(value: impl IntoIterator<Item = (String, Self)>) -> Self {
        Self::Dict(value.into_iter().collect())
    }

    pub fn to_usize(&self) -> usize {
        match self {
            Self::Int(val) => *val as _,
            _ => panic!(),
        }
    }
}
