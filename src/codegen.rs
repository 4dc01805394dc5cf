//! Coupon code generation.
//!
//! Produces codes in the fixed `SSNNNNSSNN` format: two syllabary symbols, four decimal
//! digits, two more syllabary symbols, two more decimal digits. Every symbol is drawn
//! independently from a cryptographic randomness source; there is no deterministic fallback
//! (see DESIGN.md's open-question ledger) — if the randomness source fails, generation fails.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Closed syllabary of 42 non-ASCII symbols used for the `S` positions of a coupon code.
const SYLLABARY: [char; 42] = [
    '가', '나', '다', '라', '마', '바', '사', '아', '자', '차', '카', '타', '파', '하', '거', '너',
    '더', '러', '머', '버', '서', '어', '저', '처', '커', '터', '퍼', '허', '고', '노', '도', '로',
    '모', '보', '소', '오', '조', '초', '코', '토', '포', '호',
];

lazy_static::lazy_static! {
    static ref SYLLABARY_LEN: u32 = SYLLABARY.len() as u32;
}

/// Number of symbols in a generated code (2 + 4 + 2 + 2).
pub const CODE_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// The cryptographic randomness source could not be read. Per design, this fails the
    /// request rather than falling back to a deterministic code.
    #[error("randomness source unavailable: {0}")]
    Rng(rand::Error),
}

/// Stateless, thread-safe coupon code generator.
///
/// Uniqueness of generated codes is probabilistic, not guaranteed — callers must rely on the
/// record store's `(campaign_id, code)` uniqueness constraint to catch the rare collision.
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates one coupon code. `campaign_id` and `issued_at_nanos` are accepted for parity
    /// with the reference design's inputs but do not influence the output: every symbol comes
    /// from the randomness source, not from a derived digest.
    pub fn generate(&self, _campaign_id: i64, _issued_at_nanos: i128) -> Result<String, CodegenError> {
        let mut rng = OsRng;
        let mut code = String::with_capacity(CODE_LEN);

        push_syllable(&mut rng, &mut code)?;
        push_syllable(&mut rng, &mut code)?;
        push_digits(&mut rng, &mut code, 4)?;
        push_syllable(&mut rng, &mut code)?;
        push_syllable(&mut rng, &mut code)?;
        push_digits(&mut rng, &mut code, 2)?;

        Ok(code)
    }
}

fn next_u32(rng: &mut OsRng) -> Result<u32, CodegenError> {
    let mut buf = [0u8; 4];
    rng.try_fill_bytes(&mut buf).map_err(CodegenError::Rng)?;
    Ok(u32::from_le_bytes(buf))
}

fn push_syllable(rng: &mut OsRng, out: &mut String) -> Result<(), CodegenError> {
    let idx = (next_u32(rng)? % *SYLLABARY_LEN) as usize;
    out.push(SYLLABARY[idx]);
    Ok(())
}

fn push_digits(rng: &mut OsRng, out: &mut String, count: usize) -> Result<(), CodegenError> {
    for _ in 0..count {
        let digit = (next_u32(rng)? % 10) as u8;
        out.push((b'0' + digit) as char);
    }
    Ok(())
}
