use super::models::{Block, BlockKind, RichText, plain_text};

const INDENT: &str = "    ";

/// 将页面内容块转换为 Markdown
///
/// 列表项之间单换行，其他块之间空一行；列表项的子块缩进一级。
/// 不支持的块类型直接跳过。
pub fn blocks_to_markdown(blocks: &[Block]) -> String {
    render_blocks(blocks, 0)
}

fn render_blocks(blocks: &[Block], depth: usize) -> String {
    let mut out = String::new();
    let mut number = 0;
    let mut prev_list = false;

    for block in blocks {
        number = match block.kind {
            BlockKind::NumberedListItem { .. } => number + 1,
            _ => 0,
        };

        let Some(rendered) = render_block(block, depth, number) else {
            continue;
        };

        let list = block.kind.is_list_item();
        if !out.is_empty() {
            out.push_str(if list && prev_list { "\n" } else { "\n\n" });
        }
        out.push_str(&rendered);
        prev_list = list;
    }

    out
}

fn render_block(block: &Block, depth: usize, number: usize) -> Option<String> {
    let body = match &block.kind {
        BlockKind::Paragraph { paragraph } => rich_text(&paragraph.rich_text),
        BlockKind::Heading1 { heading_1 } => format!("# {}", rich_text(&heading_1.rich_text)),
        BlockKind::Heading2 { heading_2 } => format!("## {}", rich_text(&heading_2.rich_text)),
        BlockKind::Heading3 { heading_3 } => format!("### {}", rich_text(&heading_3.rich_text)),
        BlockKind::BulletedListItem { bulleted_list_item } => {
            format!("- {}", rich_text(&bulleted_list_item.rich_text))
        }
        BlockKind::NumberedListItem { numbered_list_item } => {
            format!("{number}. {}", rich_text(&numbered_list_item.rich_text))
        }
        BlockKind::ToDo { to_do } => format!(
            "- [{}] {}",
            if to_do.checked { 'x' } else { ' ' },
            rich_text(&to_do.rich_text)
        ),
        BlockKind::Quote { quote } => quoted(&rich_text(&quote.rich_text)),
        BlockKind::Callout { callout } => {
            let text = rich_text(&callout.rich_text);
            match callout.icon.as_ref().and_then(|i| i.emoji.as_deref()) {
                Some(emoji) => quoted(&format!("{emoji} {text}")),
                None => quoted(&text),
            }
        }
        BlockKind::Code { code } => {
            let language = match code.language.as_str() {
                "plain text" => "",
                lang => lang,
            };
            format!("```{language}\n{}\n```", plain_text(&code.rich_text))
        }
        BlockKind::Divider => "---".to_string(),
        BlockKind::Image { image } => {
            format!("![{}]({})", plain_text(&image.caption), image.source.url())
        }
        BlockKind::Bookmark { bookmark } => {
            let caption = plain_text(&bookmark.caption);
            let label = if caption.is_empty() {
                bookmark.url.as_str()
            } else {
                caption.as_str()
            };
            format!("[{label}]({})", bookmark.url)
        }
        BlockKind::Unsupported => return None,
    };

    // Notion 用空段落表示间距
    if body.trim().is_empty() && block.children.is_empty() {
        return None;
    }

    let indent = INDENT.repeat(depth);
    let mut rendered = indent_lines(&body, &indent);

    if !block.children.is_empty() {
        let list = block.kind.is_list_item();
        let children = render_blocks(&block.children, if list { depth + 1 } else { depth });
        if !children.is_empty() {
            rendered.push_str(if list { "\n" } else { "\n\n" });
            rendered.push_str(&children);
        }
    }

    Some(rendered)
}

fn indent_lines(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn quoted(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 富文本转 Markdown，标记放在首尾空白之内
pub fn rich_text(segments: &[RichText]) -> String {
    segments.iter().map(segment).collect()
}

fn segment(text: &RichText) -> String {
    let raw = text.plain_text.as_str();
    let core = raw.trim();
    if core.is_empty() {
        return raw.to_string();
    }

    let start = raw.len() - raw.trim_start().len();
    let leading = &raw[..start];
    let trailing = &raw[start + core.len()..];

    let a = &text.annotations;
    let mut s = if a.code {
        format!("`{core}`")
    } else {
        core.to_string()
    };
    if a.bold {
        s = format!("**{s}**");
    }
    if a.italic {
        s = format!("_{s}_");
    }
    if a.strikethrough {
        s = format!("~~{s}~~");
    }
    if let Some(href) = &text.href {
        s = format!("[{s}]({href})");
    }

    format!("{leading}{s}{trailing}")
}
