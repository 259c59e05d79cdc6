/// A wrapper around a AWS-LC digest context that hashes a sequence of text fragments as if they
/// were concatenated, without allocating the concatenation
pub(crate) struct Hasher {
    inner: aws_lc_rs::digest::Context,
}

impl Hasher {
    pub(crate) fn new(algorithm: &'static aws_lc_rs::digest::Algorithm) -> Self {
        Self {
            inner: aws_lc_rs::digest::Context::new(algorithm),
        }
    }

    /// Text is always hashed as its UTF-8 encoding
    pub(crate) fn update_text(&mut self, text: &str) -> &mut Self {
        self.inner.update(text.as_bytes());

        self
    }

    pub(crate) fn finalize(self) -> aws_lc_rs::digest::Digest {
        self.inner.finish()
    }
}
