//! Injectable sources of randomness: session codes and sender ids.
//!
//! Sessions take both as explicit dependencies so tests can pin them.

use rand::Rng;
use uuid::Uuid;

use crate::addressing::CODE_ALPHABET;

/// Produces session codes. Enables fixed codes in tests.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

impl<T: CodeGenerator + ?Sized> CodeGenerator for &T {
    fn generate(&self, length: usize) -> String {
        (**self).generate(length)
    }
}

impl<T: CodeGenerator + ?Sized> CodeGenerator for Box<T> {
    fn generate(&self, length: usize) -> String {
        (**self).generate(length)
    }
}

/// Produces the opaque per-instance sender id.
pub trait SenderIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<T: SenderIdGenerator + ?Sized> SenderIdGenerator for &T {
    fn generate(&self) -> String {
        (**self).generate()
    }
}

/// Uniform draw over `[A-Z0-9]` from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
            .collect()
    }
}

/// UUID v4 rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSenderIds;

impl SenderIdGenerator for UuidSenderIds {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Always returns the same code, whatever length is asked for.
#[derive(Debug, Clone)]
pub struct FixedCode(pub String);

impl CodeGenerator for FixedCode {
    fn generate(&self, _length: usize) -> String {
        self.0.clone()
    }
}

/// Always returns the same sender id.
#[derive(Debug, Clone)]
pub struct FixedSenderId(pub String);

impl SenderIdGenerator for FixedSenderId {
    fn generate(&self) -> String {
        self.0.clone()
    }
}
