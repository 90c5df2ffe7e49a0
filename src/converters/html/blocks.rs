//! Renders content blocks into HTML fragments.

use std::fmt::{self, Write};

use log::{debug, warn};

use super::utils::{escape_html_attr, escape_html_text, escape_multiline};
use super::Fragment;
use crate::models::block::{Block, IconItem};
use crate::models::media::{media_kind_of_uri, MediaKind, MediaTable};

/// Renders one block.
///
/// Image blocks resolve their media index against `media`. An unresolved index
/// (or an image block without one) renders as an empty fragment so a single bad
/// reference never breaks the slide. Video media renders as a `<video>` element.
pub fn render_block(block: &Block, media: &MediaTable) -> Fragment {
    let mut out = String::new();
    match write_block(&mut out, block, media) {
        Ok(()) => Fragment::new(out),
        Err(e) => {
            warn!("Failed to render {:?} block: {}", block.kind(), e);
            Fragment::empty()
        }
    }
}

/// Renders a content slide's blocks. Video blocks always come after every
/// non-video block; relative order inside each group is kept.
pub fn render_blocks(blocks: &[Block], media: &MediaTable) -> Fragment {
    let (videos, others): (Vec<&Block>, Vec<&Block>) =
        blocks.iter().partition(|b| b.is_video(media));
    let mut out = String::new();
    for block in others.into_iter().chain(videos) {
        out.push_str(render_block(block, media).as_str());
    }
    Fragment::new(out)
}

fn write_block(out: &mut String, block: &Block, media: &MediaTable) -> fmt::Result {
    match block {
        Block::Text { html } => {
            // Authored markup; inserted as-is.
            write!(out, r#"<div class="block-text">{html}</div>"#)
        }
        Block::Heading { text } => {
            write!(out, r#"<h3 class="block-heading">{}</h3>"#, escape_html_text(text))
        }
        Block::Bullets { items } => {
            out.push_str(r#"<ul class="block-bullets">"#);
            for item in items {
                write!(out, "<li>{}</li>", escape_html_text(item))?;
            }
            out.push_str("</ul>");
            Ok(())
        }
        Block::Steps { items } => {
            out.push_str(r#"<ol class="block-steps">"#);
            for (i, item) in items.iter().enumerate() {
                write!(
                    out,
                    r#"<li><span class="step-num">{}</span><span class="step-text">{}</span></li>"#,
                    i + 1,
                    escape_html_text(item)
                )?;
            }
            out.push_str("</ol>");
            Ok(())
        }
        Block::Icons { items } => write_icons(out, items),
        Block::Tip {
            label,
            text,
            style,
            icon,
        } => {
            write!(out, r#"<div class="block-tip tip-{}">"#, style.as_str())?;
            if let Some(icon) = icon {
                write!(out, r#"<span class="tip-icon">{}</span>"#, escape_html_text(icon))?;
            }
            out.push_str(r#"<div class="tip-body">"#);
            if let Some(label) = label.as_deref().filter(|l| !l.is_empty()) {
                write!(out, "<strong>{}</strong> ", escape_html_text(label))?;
            }
            write!(out, "{}</div></div>", escape_multiline(text))
        }
        Block::Table { headers, rows } => {
            out.push_str(r#"<table class="block-table">"#);
            if !headers.is_empty() {
                out.push_str("<thead><tr>");
                for h in headers {
                    write!(out, "<th>{}</th>", escape_html_text(h))?;
                }
                out.push_str("</tr></thead>");
            }
            out.push_str("<tbody>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    write!(out, "<td>{}</td>", escape_html_text(cell))?;
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table>");
            Ok(())
        }
        Block::Code { text } => write!(
            out,
            r#"<pre class="block-code"><code>{}</code></pre>"#,
            escape_html_text(text)
        ),
        Block::Compare {
            good_label,
            good,
            bad_label,
            bad,
        } => write!(
            out,
            concat!(
                r#"<div class="block-compare">"#,
                r#"<div class="compare-good"><strong>{}</strong><p>{}</p></div>"#,
                r#"<div class="compare-bad"><strong>{}</strong><p>{}</p></div>"#,
                "</div>"
            ),
            escape_html_text(good_label),
            escape_multiline(good),
            escape_html_text(bad_label),
            escape_multiline(bad)
        ),
        Block::Image { media_index, alt } => {
            let Some(index) = media_index else {
                debug!("Image block without a media index renders empty");
                return Ok(());
            };
            let uri = match media.resolve(*index) {
                Ok(uri) => uri,
                Err(e) => {
                    warn!("{e}; rendering empty block");
                    return Ok(());
                }
            };
            let src = escape_html_attr(uri);
            let alt_attr = escape_html_attr(alt);
            match media_kind_of_uri(uri) {
                MediaKind::Video => write!(
                    out,
                    r#"<figure class="block-video"><video src="{src}" data-media-index="{index}" playsinline preload="metadata" controls></video>"#
                )?,
                _ => write!(
                    out,
                    r#"<figure class="block-image"><img src="{src}" alt="{alt_attr}" loading="lazy">"#
                )?,
            }
            if !alt.is_empty() {
                write!(out, "<figcaption>{}</figcaption>", escape_html_text(alt))?;
            }
            out.push_str("</figure>");
            Ok(())
        }
        Block::Divider => {
            out.push_str(r#"<hr class="block-divider">"#);
            Ok(())
        }
        Block::Other(raw) => {
            debug!("Unknown block renders empty: {raw}");
            Ok(())
        }
    }
}

fn write_icons(out: &mut String, items: &[IconItem]) -> fmt::Result {
    out.push_str(r#"<div class="block-icons">"#);
    for item in items {
        write!(
            out,
            r#"<div class="icon-item"><span class="icon">{}</span><div><strong>{}</strong>"#,
            escape_html_text(&item.icon),
            escape_html_text(&item.label)
        )?;
        if !item.desc.is_empty() {
            write!(out, "<p>{}</p>", escape_html_text(&item.desc))?;
        }
        out.push_str("</div></div>");
    }
    out.push_str("</div>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MediaTable {
        let mut media = MediaTable::new();
        media.insert(0, "data:image/png;base64,iVBORw0KGgo=");
        media.insert(3, "data:video/mp4;base64,AAAAIGZ0eXA=");
        media
    }

    fn image(index: Option<usize>, alt: &str) -> Block {
        Block::Image {
            media_index: index,
            alt: alt.into(),
        }
    }

    #[test]
    fn unresolved_image_renders_empty() {
        let media = media();
        let found = render_block(&image(Some(0), "chart"), &media);
        let missing = render_block(&image(Some(7), "gone"), &media);
        assert!(found.as_str().contains("<img"));
        assert!(missing.is_empty());
        assert!(render_block(&image(None, "none"), &media).is_empty());

        let both = render_blocks(&[image(Some(0), "a"), image(Some(7), "b")], &media);
        assert_eq!(both.as_str().matches("<img").count(), 1);
    }

    #[test]
    fn video_media_renders_player_after_other_blocks() {
        let media = media();
        let blocks = vec![
            image(Some(3), "walkthrough"),
            Block::Heading {
                text: "Steps".into(),
            },
            image(Some(0), "diagram"),
        ];
        let html = render_blocks(&blocks, &media).into_string();
        let video_at = html.find("<video").unwrap();
        assert!(html.find("<h3").unwrap() < video_at);
        assert!(html.find("<img").unwrap() < video_at);
        assert!(html.contains(r#"data-media-index="3""#));
    }

    #[test]
    fn text_content_is_escaped() {
        let media = MediaTable::new();
        let html = render_block(
            &Block::Bullets {
                items: vec!["<b>&</b>".into()],
            },
            &media,
        );
        assert_eq!(
            html.as_str(),
            r#"<ul class="block-bullets"><li>&lt;b&gt;&amp;&lt;/b&gt;</li></ul>"#
        );
        assert!(render_block(&Block::Other(serde_json::json!({"kind": "poll"})), &media)
            .is_empty());
    }
}
