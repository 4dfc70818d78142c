//! Class rosters exported from the contest site.
use crate::error::WxErr;
use std::{fs::File, io::Read, path::Path};

/// Class value for students not enrolled in any class.
pub const NO_CLASS: &str = "No Class ID";

/// Synthetic class that holds every roster entry.
pub const ALL_CLASS: &str = "All";

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RosterEntry {
    pub forecaster_id: String,
    pub first_name: String,
    pub last_name: String,
    /// One value per class column, `NO_CLASS` when empty.
    pub classes: Vec<String>,
}

impl RosterEntry {
    pub fn in_class(&self, class: &str) -> bool {
        class == ALL_CLASS || self.classes.iter().any(|c| c == class)
    }

    /// True if the student is enrolled in at least one class.
    pub fn has_class(&self) -> bool {
        self.classes.iter().any(|c| c != NO_CLASS)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

/// Column positions found in the header row.
#[derive(Default)]
struct Columns {
    id: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
    full_name: Option<usize>,
    classes: Vec<usize>,
}

impl Columns {
    fn detect(header: &csv::StringRecord) -> Result<Self, String> {
        let mut cols = Columns::default();
        for (i, name) in header.iter().enumerate() {
            let name = name.trim().to_lowercase();
            if name.contains("class") {
                cols.classes.push(i);
            } else if name.contains("first_name") {
                cols.first = Some(i);
            } else if name.contains("last_name") {
                cols.last = Some(i);
            } else if name == "forecaster_id" || name == "id" {
                cols.id = Some(i);
            } else if name == "name" {
                cols.full_name = Some(i);
            }
        }

        if cols.id.is_none() {
            return Err("no forecaster_id column".to_owned());
        }
        if (cols.first.is_none() || cols.last.is_none()) && cols.full_name.is_none() {
            return Err("no first_name/last_name or NAME columns".to_owned());
        }

        Ok(cols)
    }

    fn entry(&self, row: &csv::StringRecord) -> Option<RosterEntry> {
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::trim);

        let forecaster_id = field(self.id).filter(|id| !id.is_empty())?.to_owned();

        let (first_name, last_name) = match (field(self.first), field(self.last)) {
            (Some(first), Some(last)) => (first.to_owned(), last.to_owned()),
            _ => split_name(field(self.full_name).unwrap_or("")),
        };

        let classes = self
            .classes
            .iter()
            .map(|&i| match row.get(i).map(str::trim) {
                None | Some("") | Some("None") => NO_CLASS.to_owned(),
                Some(class) => class.to_owned(),
            })
            .collect();

        Some(RosterEntry {
            forecaster_id,
            first_name,
            last_name,
            classes,
        })
    }
}

/// The last word is the last name, everything before it the first name.
fn split_name(full: &str) -> (String, String) {
    let words: Vec<&str> = full.split_whitespace().collect();
    match words.split_last() {
        Some((last, first)) => (first.join(" "), (*last).to_owned()),
        None => (String::new(), String::new()),
    }
}

impl Roster {
    pub fn from_path(path: &Path) -> Result<Self, WxErr> {
        let file = File::open(path)?;
        Self::from_reader(file)
            .map_err(|err| match err {
                WxErr::InvalidRoster(msg) => {
                    WxErr::InvalidRoster(format!("{}: {}", path.display(), msg))
                }
                err => err,
            })
    }

    /// Read either the older `forecaster_id,first_name,last_name,class_id...` layout or the
    /// `ID,...,NAME,CLASS1,CLASS2,...` site export. Rows without an id are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, WxErr> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header = rdr.headers()?.clone();
        let cols = Columns::detect(&header).map_err(WxErr::InvalidRoster)?;

        let mut entries = vec![];
        for row in rdr.records() {
            if let Some(entry) = cols.entry(&row?) {
                entries.push(entry);
            }
        }

        Ok(Roster { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn get(&self, forecaster_id: &str) -> Option<&RosterEntry> {
        self.entries
            .iter()
            .find(|e| e.forecaster_id == forecaster_id)
    }

    /// Class ids in order of first appearance, without `NO_CLASS`.
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = vec![];
        for class in self.entries.iter().flat_map(|e| e.classes.iter()) {
            if class != NO_CLASS && !classes.contains(&class.as_str()) {
                classes.push(class);
            }
        }
        classes
    }

    /// Entries enrolled in `class`; `ALL_CLASS` returns everyone.
    pub fn members<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a RosterEntry> + 'a {
        self.entries.iter().filter(move |e| e.in_class(class))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CLASSIC: &str = "\
forecaster_id,first_name,last_name,class_id_1,class_id_2
jdoe,Jane,Doe,METR 101,METR 440
bsmith,Bob,Smith,METR 101,No Class ID
cwu,Chen,Wu,No Class ID,No Class ID
,Nobody,Here,METR 101,
";

    const EXPORT_2020: &str = "\
ID,PASSWORD,CAT,REG_PER,CLASS1,CLASS2,NAME,EMAIL
jdoe,pw,3,Fall,METR 101,None,Jane Q Doe,jdoe@example.edu
bsmith,pw,3,Yearly,None,None,Bob Smith,bsmith@example.edu
";

    #[test]
    fn test_classic_layout() {
        let roster = Roster::from_reader(CLASSIC.as_bytes()).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.classes(), vec!["METR 101", "METR 440"]);

        let ids: Vec<&str> = roster
            .members("METR 101")
            .map(|e| e.forecaster_id.as_str())
            .collect();
        assert_eq!(ids, vec!["jdoe", "bsmith"]);

        assert_eq!(roster.members(ALL_CLASS).count(), 3);
        assert!(!roster.get("cwu").unwrap().has_class());
        assert!(roster.get("jdoe").unwrap().in_class("METR 440"));
    }

    #[test]
    fn test_2020_export_layout() {
        let roster = Roster::from_reader(EXPORT_2020.as_bytes()).unwrap();
        let jdoe = roster.get("jdoe").unwrap();
        assert_eq!(jdoe.first_name, "Jane Q");
        assert_eq!(jdoe.last_name, "Doe");
        assert_eq!(jdoe.classes, vec!["METR 101", NO_CLASS]);

        assert!(!roster.get("bsmith").unwrap().has_class());
        assert_eq!(roster.classes(), vec!["METR 101"]);
    }

    #[test]
    fn test_missing_columns() {
        match Roster::from_reader("first_name,last_name\nJane,Doe\n".as_bytes()) {
            Err(WxErr::InvalidRoster(msg)) => assert!(msg.contains("forecaster_id")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
