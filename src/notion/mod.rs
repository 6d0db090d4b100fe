mod client;
mod markdown;
mod models;

pub use self::{
    client::NotionClient,
    markdown::{blocks_to_markdown, rich_text},
    models::{Block, BlockKind, Page, Property, RichText, slugify},
};
