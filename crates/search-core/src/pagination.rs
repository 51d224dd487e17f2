//! Page number ⇄ result offset conversion.

use std::num::NonZeroU32;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("page size must be at least 1")]
    ZeroPageSize,
    #[error("page {page} with {page_size} results per page is past the last addressable offset")]
    OffsetOverflow { page: u32, page_size: u32 },
}

/// Page size clamped to at least one result.
pub fn clamp_page_size(page_size: u32) -> NonZeroU32 {
    NonZeroU32::new(page_size).unwrap_or_else(|| {
        warn!("page size 0 clamped to 1");
        NonZeroU32::MIN
    })
}

pub fn to_offset(page: u32, page_size: u32) -> u32 {
    page.saturating_mul(clamp_page_size(page_size).get())
}

pub fn to_page(offset: u32, page_size: u32) -> u32 {
    offset / clamp_page_size(page_size)
}

/// Like [`to_offset`] but rejects a zero page size instead of clamping it,
/// and an offset that does not fit instead of saturating.
pub fn checked_offset(page: u32, page_size: u32) -> Result<u32, PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::ZeroPageSize);
    }
    page.checked_mul(page_size)
        .ok_or(PaginationError::OffsetOverflow { page, page_size })
}

/// Like [`to_page`] but rejects a zero page size instead of clamping it.
pub fn checked_page(offset: u32, page_size: u32) -> Result<u32, PaginationError> {
    NonZeroU32::new(page_size)
        .map(|size| offset / size)
        .ok_or(PaginationError::ZeroPageSize)
}

/// Number of pages needed for `total` results.
pub fn page_count(total: u32, page_size: u32) -> u32 {
    total.div_ceil(clamp_page_size(page_size).get())
}
