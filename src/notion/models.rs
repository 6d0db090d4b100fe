use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::content::{Post, PostStatus};

/// 分页列表响应
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// 错误响应
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

/// 富文本片段
#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

pub fn plain_text(segments: &[RichText]) -> String {
    segments.iter().map(|t| t.plain_text.as_str()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    pub start: String,
}

/// 数据库页面属性，只解析用到的类型
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Date {
        date: Option<DateValue>,
    },
    MultiSelect {
        multi_select: Vec<SelectOption>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Status {
        status: Option<SelectOption>,
    },
    Checkbox {
        checkbox: bool,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

/// 外链或 Notion 托管的文件
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileObject {
    External { external: FileUrl },
    File { file: FileUrl },
}

impl FileObject {
    pub fn url(&self) -> &str {
        match self {
            FileObject::External { external } => &external.url,
            FileObject::File { file } => &file.url,
        }
    }
}

/// 数据库中的一页，即一篇文章
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub cover: Option<FileObject>,
    #[serde(default)]
    pub properties: HashMap<String, Property>,
}

impl Page {
    fn property(&self, names: &[&str]) -> Option<&Property> {
        names.iter().find_map(|name| {
            self.properties
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, p)| p)
        })
    }

    fn title(&self) -> Option<String> {
        self.properties.values().find_map(|p| match p {
            Property::Title { title } => Some(plain_text(title).trim().to_string()),
            _ => None,
        })
    }

    fn text(&self, names: &[&str]) -> Option<String> {
        match self.property(names)? {
            Property::RichText { rich_text } => {
                Some(plain_text(rich_text).trim().to_string()).filter(|s| !s.is_empty())
            }
            _ => None,
        }
    }

    fn date(&self) -> NaiveDate {
        let start = match self.property(&["Date", "Published"]) {
            Some(Property::Date { date: Some(date) }) => Some(date.start.as_str()),
            _ => None,
        };

        // 日期可能带时间部分，只取前 10 个字符
        start
            .and_then(|s| s.get(..10))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .unwrap_or_else(|| self.created_time.date_naive())
    }

    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = match self.property(&["Categories", "Category", "Tags"]) {
            Some(Property::MultiSelect { multi_select }) => {
                multi_select.iter().map(|o| o.name.clone()).collect()
            }
            Some(Property::Select { select: Some(o) }) => vec![o.name.clone()],
            _ => vec![],
        };
        categories.dedup();
        categories
    }

    fn status(&self) -> PostStatus {
        let published = match self.property(&["Status"]) {
            Some(Property::Status { status: Some(o) }) | Some(Property::Select { select: Some(o) }) => {
                o.name.eq_ignore_ascii_case("published")
            }
            Some(Property::Checkbox { checkbox }) => *checkbox,
            _ => false,
        };

        if published {
            PostStatus::Published
        } else {
            PostStatus::Draft
        }
    }

    /// 转换为 [`Post`]，没有标题的页面返回 `None`
    ///
    /// `Slug` 属性为空时由标题生成。
    pub fn into_post(self) -> Option<Post> {
        let title = self.title().filter(|t| !t.is_empty())?;
        let slug = self
            .text(&["Slug"])
            .unwrap_or_else(|| slugify(&title));
        if slug.is_empty() {
            return None;
        }

        Some(Post {
            date: self.date(),
            categories: self.categories(),
            summary: self.text(&["Summary", "Excerpt", "Description"]),
            cover: self.cover.as_ref().map(|c| c.url().to_string()),
            status: self.status(),
            content: None,
            id: self.id,
            title,
            slug,
        })
    }
}

/// 由标题生成 slug：小写字母数字，其余字符合并为 `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToDoBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Emoji {
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalloutBlock {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub icon: Option<Emoji>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageBlock {
    #[serde(flatten)]
    pub source: FileObject,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkBlock {
    pub url: String,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

/// 块类型，不支持的类型解析为 [`BlockKind::Unsupported`]
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph {
        paragraph: TextBlock,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        heading_1: TextBlock,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        heading_2: TextBlock,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        heading_3: TextBlock,
    },
    BulletedListItem {
        bulleted_list_item: TextBlock,
    },
    NumberedListItem {
        numbered_list_item: TextBlock,
    },
    ToDo {
        to_do: ToDoBlock,
    },
    Quote {
        quote: TextBlock,
    },
    Callout {
        callout: CalloutBlock,
    },
    Code {
        code: CodeBlock,
    },
    Divider,
    Image {
        image: ImageBlock,
    },
    Bookmark {
        bookmark: BookmarkBlock,
    },
    #[serde(other)]
    Unsupported,
}

impl BlockKind {
    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            BlockKind::BulletedListItem { .. }
                | BlockKind::NumberedListItem { .. }
                | BlockKind::ToDo { .. }
        )
    }
}

/// 页面内容块
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub kind: BlockKind,
    /// 子块需要单独请求，由客户端填充
    #[serde(skip)]
    pub children: Vec<Block>,
}
