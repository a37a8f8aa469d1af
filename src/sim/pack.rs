//! Level pack files: campaign ↔ XML.
//!
//! ## Format
//!   ```xml
//!   <?xml version="1.0" encoding="UTF-8" standalone="no"?>
//!   <level-pack name="classic">
//!       <level number="1" completed="false">
//!           <game-field>
//!               <column>
//!                   <start/>
//!                   <empty/>
//!               </column>
//!               <column>
//!                   <wall/>
//!                   <finish/>
//!               </column>
//!           </game-field>
//!       </level>
//!   </level-pack>
//!   ```
//!
//! One `<column>` per x, one cell element per y inside it.
//! Cell tags: `wall`, `empty`, `start`, `finish`, `background`.
//! Whitespace and comments between elements are ignored; anything else that
//! does not fit the format is a load error for the whole pack. So is a pack
//! without levels or a level with more than one `<game-field>`.
//!
//! ## Sources (priority order):
//!   1. Pack file on disk (`<levels_dir>/<campaign>.xml`)
//!   2. Built-in embedded copy of the bundled campaigns

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, info};
use xmlwriter::{Indent, Options, XmlWriter};

use crate::domain::cell::CellKind;
use crate::domain::grid::Grid;
use crate::error::{PackError, PackResult};
use crate::sim::level::{Campaign, Level};

const ROOT: &str = "level-pack";
const LEVEL: &str = "level";
const GAME_FIELD: &str = "game-field";
const COLUMN: &str = "column";

/// Embedded copies of the campaigns shipped with the game.
pub fn embedded_pack(name: &str) -> Option<&'static str> {
    match name {
        "classic" => Some(include_str!("../../levels/classic.xml")),
        "extended" => Some(include_str!("../../levels/extended.xml")),
        _ => None,
    }
}

// ══════════════════════════════════════════════════════════════
// Persistence store
// ══════════════════════════════════════════════════════════════

/// Where campaigns are loaded from and saved back to.
pub trait CampaignStore {
    fn load(&self) -> PackResult<Campaign>;
    fn save(&self, campaign: &Campaign) -> PackResult<()>;
}

/// A campaign stored as one XML file, with an optional embedded fallback
/// used when the file does not exist yet.
#[derive(Clone, Debug)]
pub struct XmlFileStore {
    path: PathBuf,
    fallback: Option<&'static str>,
}

impl XmlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        XmlFileStore { path: path.into(), fallback: None }
    }

    pub fn with_fallback(mut self, xml: Option<&'static str>) -> Self {
        self.fallback = xml;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CampaignStore for XmlFileStore {
    fn load(&self) -> PackResult<Campaign> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let campaign = from_xml(&text)?;
                info!(path = %self.path.display(), levels = campaign.len(), "level pack loaded");
                Ok(campaign)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match self.fallback {
                Some(xml) => {
                    debug!(path = %self.path.display(), "pack file missing, using embedded copy");
                    from_xml(xml)
                }
                None => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, campaign: &Campaign) -> PackResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, to_xml(campaign))?;
        info!(path = %self.path.display(), completed = campaign.completed_count(), "level pack saved");
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Serializing
// ══════════════════════════════════════════════════════════════

pub fn to_xml(campaign: &Campaign) -> String {
    let opt = Options {
        indent: Indent::Spaces(4),
        ..Options::default()
    };
    let mut w = XmlWriter::new(opt);
    w.write_declaration();
    w.start_element(ROOT);
    w.write_attribute("name", campaign.name());

    for level in campaign.levels() {
        w.start_element(LEVEL);
        w.write_attribute("number", level.number());
        w.write_attribute("completed", &level.is_completed());
        w.start_element(GAME_FIELD);
        for column in level.grid().columns() {
            w.start_element(COLUMN);
            for cell in column {
                w.start_element(cell.kind().tag());
                w.end_element();
            }
            w.end_element();
        }
        w.end_element(); // game-field
        w.end_element(); // level
    }

    w.end_document()
}

// ══════════════════════════════════════════════════════════════
// De-serializing
// ══════════════════════════════════════════════════════════════

pub fn from_xml(text: &str) -> PackResult<Campaign> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != ROOT {
        return Err(PackError::UnexpectedRoot(root.tag_name().name().to_string()));
    }
    let name = root.attribute("name").unwrap_or_default();

    let mut levels = vec![];
    for node in elements(root) {
        expect_tag(node, LEVEL, ROOT)?;
        levels.push(parse_level(node)?);
    }
    if levels.is_empty() {
        return Err(PackError::EmptyPack);
    }

    Ok(Campaign::new(name, levels))
}

fn parse_level(node: Node) -> PackResult<Level> {
    let number = node.attribute("number").unwrap_or_default().to_string();
    let completed = match node.attribute("completed") {
        None => false,
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        Some(v) if v.eq_ignore_ascii_case("false") => false,
        Some(v) => {
            return Err(PackError::BadCompleted { level: number, value: v.to_string() });
        }
    };

    let mut field = None;
    for child in elements(node) {
        expect_tag(child, GAME_FIELD, LEVEL)?;
        if field.replace(child).is_some() {
            return Err(PackError::UnexpectedElement {
                parent: LEVEL.to_string(),
                tag: GAME_FIELD.to_string(),
            });
        }
    }
    let field = field.ok_or_else(|| PackError::MissingGameField { level: number.clone() })?;

    let mut columns = vec![];
    for column in elements(field) {
        expect_tag(column, COLUMN, GAME_FIELD)?;
        let mut cells = vec![];
        for cell in elements(column) {
            let tag = cell.tag_name().name();
            let kind = CellKind::from_tag(tag).ok_or_else(|| PackError::UnknownCell {
                level: number.clone(),
                tag: tag.to_string(),
            })?;
            cells.push(kind);
        }
        columns.push(cells);
    }

    let grid = Grid::from_columns(columns)
        .map_err(|e| PackError::Level { number: number.clone(), source: e.into() })?;
    let level = Level::new(number.clone(), grid)
        .map_err(|source| PackError::Level { number, source })?;
    Ok(level.with_completed(completed))
}

/// Element children only: whitespace text and comments are skipped.
fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn expect_tag(node: Node, tag: &str, parent: &str) -> PackResult<()> {
    if node.tag_name().name() == tag {
        Ok(())
    } else {
        Err(PackError::UnexpectedElement {
            parent: parent.to_string(),
            tag: node.tag_name().name().to_string(),
        })
    }
}
