pub mod request;
pub mod response;

pub use request::{
    ContentType, FillPdfPayload, GeneratePdfData, GeneratePdfPayload, Logo, Page,
    TemplateVersion,
};
pub use response::EtchPacket;
