use serde::{Deserialize, Serialize};

/// Records requested per listing call. Copper caps `page_size` at 200.
pub const PAGE_SIZE: u32 = 200;

/// Opaque position handed back to the caller between listing calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuation {
    pub page_number: u32,
}

impl Continuation {
    pub fn page_to_fetch(previous: Option<&Continuation>) -> u32 {
        previous
            .map(|continuation| continuation.page_number)
            .filter(|page_number| *page_number > 0)
            .unwrap_or(1)
    }

    /// Only a full page suggests more data may follow.
    pub fn after_page(page_number: u32, result_len: usize) -> Option<Self> {
        if result_len != PAGE_SIZE as usize {
            return None;
        }
        page_number
            .checked_add(1)
            .map(|page_number| Self { page_number })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncPage<T> {
    pub result: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
}

impl<T> SyncPage<T> {
    pub fn from_page(page_number: u32, result: Vec<T>) -> Self {
        let continuation = Continuation::after_page(page_number, result.len());
        Self {
            result,
            continuation,
        }
    }
}
