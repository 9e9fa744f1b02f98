use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ReaderError;
use crate::feed::types::{FeedMeta, ParsedFeed, ParsedPost};

/// Fields read from `<channel>` and `<item>` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Link => "link",
            Field::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Channel,
    Item,
}

/// Text being collected for one field. `depth` is the stack length while the
/// field element is open.
struct Capture {
    owner: Owner,
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Default)]
struct ItemBuilder {
    depth: usize,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

impl ItemBuilder {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
        }
    }

    fn finish(self, index: usize) -> Result<ParsedPost, ReaderError> {
        let missing = |field: Field| {
            ReaderError::InvalidFeed(format!("item {} is missing <{}>", index + 1, field.tag()))
        };
        Ok(ParsedPost {
            title: self.title.ok_or_else(|| missing(Field::Title))?,
            link: self.link.ok_or_else(|| missing(Field::Link))?,
            description: self.description.ok_or_else(|| missing(Field::Description))?,
        })
    }
}

#[derive(Default)]
struct ChannelBuilder {
    seen: bool,
    title: Option<String>,
    description: Option<String>,
}

impl ChannelBuilder {
    fn slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::Link => None,
        }
    }
}

/// Parses an RSS document into channel metadata and its items.
///
/// The channel title and description are the direct `<title>` and
/// `<description>` children of `<channel>`. Every `<item>` contributes one
/// post built from its direct `<title>`, `<link>` and `<description>`
/// children, in document order. Element text is the concatenation of all
/// descendant text and CDATA, unescaped and trimmed.
///
/// # Errors
///
/// Returns [`ReaderError::InvalidFeed`] when the document is not well-formed
/// XML, has no `<channel>`, or lacks any of the required elements. An element
/// that is present but empty is accepted as an empty string.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed, ReaderError> {
    // quick-xml (0.37) never expands <!ENTITY> declarations; unknown entities
    // surface as unescape errors and are reported as invalid feeds.
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut channel = ChannelBuilder::default();
    let mut item: Option<ItemBuilder> = None;
    let mut capture: Option<Capture> = None;
    let mut posts = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                open_element(&e, &stack, &mut channel, &mut item, &mut capture);
                stack.push(e.name().as_ref().to_vec());
            }
            Ok(Event::Empty(e)) => {
                // A self-closing element opens and closes in one event
                open_element(&e, &stack, &mut channel, &mut item, &mut capture);
                stack.push(e.name().as_ref().to_vec());
                close_element(&mut stack, &mut channel, &mut item, &mut capture, &mut posts)?;
            }
            Ok(Event::End(_)) => {
                close_element(&mut stack, &mut channel, &mut item, &mut capture, &mut posts)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(capture) = capture.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| ReaderError::InvalidFeed(err.to_string()))?;
                    capture.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(capture) = capture.as_mut() {
                    capture.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ReaderError::InvalidFeed(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(ReaderError::InvalidFeed(
            "document ended with unclosed elements".to_string(),
        ));
    }
    if !channel.seen {
        return Err(ReaderError::InvalidFeed(
            "missing <channel> element".to_string(),
        ));
    }

    let feed = FeedMeta {
        title: channel.title.ok_or_else(|| {
            ReaderError::InvalidFeed("channel is missing <title>".to_string())
        })?,
        description: channel.description.ok_or_else(|| {
            ReaderError::InvalidFeed("channel is missing <description>".to_string())
        })?,
    };

    Ok(ParsedFeed { feed, posts })
}

/// Handles an opening tag. `stack` does not yet include the element.
fn open_element(
    e: &BytesStart<'_>,
    stack: &[Vec<u8>],
    channel: &mut ChannelBuilder,
    item: &mut Option<ItemBuilder>,
    capture: &mut Option<Capture>,
) {
    // Markup inside a captured field only contributes its text
    if capture.is_some() {
        return;
    }

    let name = e.name();
    let name = name.as_ref();
    let depth = stack.len() + 1;

    if name == b"channel" {
        channel.seen = true;
        return;
    }

    if name == b"item" {
        if item.is_none() {
            *item = Some(ItemBuilder {
                depth,
                ..ItemBuilder::default()
            });
        }
        return;
    }

    let Some(field) = Field::from_name(name) else {
        return;
    };

    if let Some(current) = item.as_mut() {
        // Only direct children of <item> count
        if current.depth == stack.len() && current.slot(field).is_none() {
            *capture = Some(Capture {
                owner: Owner::Item,
                field,
                depth,
                text: String::new(),
            });
        }
        return;
    }

    if stack.last().map(Vec::as_slice) == Some(b"channel".as_slice()) {
        if let Some(slot) = channel.slot(field) {
            if slot.is_none() {
                *capture = Some(Capture {
                    owner: Owner::Channel,
                    field,
                    depth,
                    text: String::new(),
                });
            }
        }
    }
}

/// Handles a closing tag, completing any capture or item it ends.
fn close_element(
    stack: &mut Vec<Vec<u8>>,
    channel: &mut ChannelBuilder,
    item: &mut Option<ItemBuilder>,
    capture: &mut Option<Capture>,
    posts: &mut Vec<ParsedPost>,
) -> Result<(), ReaderError> {
    stack.pop();
    let depth = stack.len();

    if capture.as_ref().is_some_and(|c| depth < c.depth) {
        if let Some(done) = capture.take() {
            let text = done.text.trim().to_string();
            match done.owner {
                Owner::Item => {
                    if let Some(current) = item.as_mut() {
                        *current.slot(done.field) = Some(text);
                    }
                }
                Owner::Channel => {
                    if let Some(slot) = channel.slot(done.field) {
                        *slot = Some(text);
                    }
                }
            }
        }
    }

    if item.as_ref().is_some_and(|i| depth < i.depth) {
        if let Some(done) = item.take() {
            let index = posts.len();
            posts.push(done.finish(index)?);
        }
    }

    Ok(())
}
