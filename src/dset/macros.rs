#[macro_export]
macro_rules! op_func_id {
    ($name: ident) => {
        $crate::utils::hash_ident(concat!(module_path!(), "::", stringify!($name)))
    };
}

/// Declare operator function structs: arguments in parentheses, captured
/// ("enclosed") fields in brackets, then the result type and body.
///
/// ```ignore
/// def_op_func!(
///     APlusB(a: u64, b: u64)[] -> u64 { a + b }
///     AMultC(a: u32)[c: u32] -> u32 { a * c }
/// );
/// ```
#[macro_export]
macro_rules! def_op_func {
    ($($name: ident($($farg:ident : $argt: ty),*)
                   [$($enclosed:ident : $ety: ty),*] -> $rt:ty $body:block)*) =>
    {
        $(
            #[derive(serde_derive::Serialize, serde_derive::Deserialize, Clone, PartialEq, Debug)]
            pub struct $name {
               $(pub $enclosed: $ety),*
            }
            impl $crate::dset::funcs::OpFunc for $name {
                type In = ($($argt,)*);
                type Out = $rt;
                fn apply(&self, args: Self::In) -> $rt {
                    let ($($farg,)*) = args;
                    $(let $enclosed = self.$enclosed.clone();)*
                    $body
                }
                fn id() -> u64 {
                    $crate::op_func_id!($name)
                }
            }
        )*
    };
}
