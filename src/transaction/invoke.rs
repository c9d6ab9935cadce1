/// A callable applied to a tuple of arguments.
///
/// Implemented for every `FnOnce` of up to six parameters, so
/// `transaction_with(key, f, (a, b))` calls `f(a, b)` and
/// `transaction_with(key, f, ())` calls `f()`. Closures passed this way need
/// their parameter types spelled out, since they are not inferred through
/// the trait.
pub trait Invoke<Args> {
    type Output;

    fn invoke(self, args: Args) -> Self::Output;
}

macro_rules! impl_invoke {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> Invoke<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A);
impl_invoke!(A, B);
impl_invoke!(A, B, C);
impl_invoke!(A, B, C, D);
impl_invoke!(A, B, C, D, E);
impl_invoke!(A, B, C, D, E, G);
