use easy_ext::ext;
use std::borrow::Cow;

pub(crate) mod prelude {
    pub(crate) use super::ErrorExt as _;
    pub(crate) use super::StrExt as _;
}

#[ext(ErrorExt)]
pub(crate) impl<E> E
where
    E: std::error::Error + ?Sized,
{
    fn display_chain(&self) -> display_error_chain::DisplayErrorChain<&Self> {
        display_error_chain::DisplayErrorChain::new(self)
    }
}

#[ext(StrExt)]
pub(crate) impl str {
    /// Cuts the string to at most `max_chars` characters. If anything was cut
    /// the last kept character is replaced with `…`.
    fn truncate_chars(&self, max_chars: usize) -> Cow<'_, str> {
        let Some((end, _)) = self.char_indices().nth(max_chars) else {
            return Cow::Borrowed(self);
        };

        let Some((end, _)) = self[..end].char_indices().next_back() else {
            return Cow::Borrowed("");
        };

        Cow::Owned(format!("{}…", &self[..end]))
    }
}
