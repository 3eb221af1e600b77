/// Kotlin-style scope functions, handy at the end of long method chains.
pub trait LetAlso: Sized {
    fn let_owned<R, F: FnOnce(Self) -> R>(self, f: F) -> R {
        f(self)
    }

    fn let_ref<R, F: FnOnce(&Self) -> R>(&self, f: F) -> R {
        f(self)
    }

    fn also<F: FnOnce(&mut Self)>(mut self, f: F) -> Self {
        f(&mut self);
        self
    }
}

impl<T> LetAlso for T {}
