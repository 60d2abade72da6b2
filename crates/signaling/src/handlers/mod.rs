//! Handler-Module fuer die einzelnen Ereignis-Familien

pub mod call_handler;
pub mod chat_handler;
pub mod presence_handler;
pub mod typing_handler;
