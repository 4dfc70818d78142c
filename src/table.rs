//! In-memory collection of forecast records with grouping over a fixed set of key fields.
use crate::record::{NaturalKey, Record, Semester};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

/// The fields a table can be grouped on.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum KeyField {
    School,
    Year,
    Semester,
    Identifier,
    Day,
    Category,
    Name,
}

impl KeyField {
    /// The grouping used for grading, one group per city per school season.
    pub const STATION: [KeyField; 4] = [
        KeyField::School,
        KeyField::Year,
        KeyField::Semester,
        KeyField::Identifier,
    ];

    /// Like `STATION` but without the school; national rows are school agnostic.
    pub const NATIONAL_STATION: [KeyField; 3] =
        [KeyField::Year, KeyField::Semester, KeyField::Identifier];

    fn value(self, rec: &Record) -> KeyValue {
        match self {
            KeyField::School => KeyValue::Text(rec.school().to_owned()),
            KeyField::Year => KeyValue::Int(i64::from(rec.year())),
            KeyField::Semester => KeyValue::Semester(rec.semester()),
            KeyField::Identifier => KeyValue::Text(rec.identifier().to_owned()),
            KeyField::Day => KeyValue::Int(i64::from(rec.day())),
            KeyField::Category => KeyValue::Int(i64::from(rec.category())),
            KeyField::Name => KeyValue::Text(rec.name().to_owned()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum KeyValue {
    Int(i64),
    Semester(Semester),
    Text(String),
}

/// A tuple of key values, in the order the key fields were requested.
pub type GroupKey = Vec<KeyValue>;

/// How to order the results of [`ForecastTable::unique_combinations`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Order {
    /// Order of first appearance when the rows are walked by date.
    FirstSeen,
    /// Lexicographic order of the key tuples.
    Sorted,
}

/// What [`ForecastTable::upsert`] did with a record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

/// Running totals of upsert outcomes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl UpsertCounts {
    pub fn add(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Updated => self.updated += 1,
            Upsert::Unchanged => self.unchanged += 1,
        }
    }
}

/// Filter over records. Values within a field are OR'ed, fields are AND'ed, and an empty
/// field matches everything.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub names: Vec<String>,
    pub schools: Vec<String>,
    pub categories: Vec<u8>,
    pub semesters: Vec<Semester>,
    pub years: Vec<i32>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name<T: AsRef<str>>(mut self, name: T) -> Self {
        self.names.push(name.as_ref().to_owned());
        self
    }

    pub fn school<T: AsRef<str>>(mut self, school: T) -> Self {
        self.schools.push(school.as_ref().to_lowercase());
        self
    }

    pub fn category(mut self, category: u8) -> Self {
        self.categories.push(category);
        self
    }

    pub fn semester(mut self, semester: Semester) -> Self {
        self.semesters.push(semester);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.years.push(year);
        self
    }

    pub fn matches(&self, rec: &Record) -> bool {
        fn any_of<T: PartialEq>(vals: &[T], val: &T) -> bool {
            vals.is_empty() || vals.contains(val)
        }

        any_of(&self.names, &rec.name().to_owned())
            && any_of(&self.schools, &rec.school().to_owned())
            && any_of(&self.categories, &rec.category())
            && any_of(&self.semesters, &rec.semester())
            && any_of(&self.years, &rec.year())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ForecastTable {
    records: Vec<Record>,
    index: HashMap<NaturalKey, usize>,
}

impl ForecastTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record, or overwrite the stored one with the same natural key if any value
    /// differs. Re-inserting identical data changes nothing.
    pub fn upsert(&mut self, rec: Record) -> Upsert {
        let key = rec.natural_key();
        match self.index.get(&key) {
            Some(&idx) if self.records[idx] == rec => Upsert::Unchanged,
            Some(&idx) => {
                self.records[idx] = rec;
                Upsert::Updated
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(rec);
                Upsert::Inserted
            }
        }
    }

    pub fn get(&self, key: &NaturalKey) -> Option<&Record> {
        self.index.get(key).map(|&idx| &self.records[idx])
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Records ordered by school, year, semester, city, day, category and name.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().sorted_by(|a, b| {
            (a.school(), a.year(), a.semester(), a.identifier())
                .cmp(&(b.school(), b.year(), b.semester(), b.identifier()))
                .then_with(|| {
                    (a.day(), a.category(), a.name()).cmp(&(b.day(), b.category(), b.name()))
                })
        })
    }

    pub fn query(&self, filter: &Filter) -> Vec<&Record> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Split off the school-agnostic national rows (models, national consensus, climatology).
    ///
    /// Returns `(school_rows, national_rows)`.
    pub fn partition_national(self) -> (ForecastTable, ForecastTable) {
        let (national, school): (Vec<Record>, Vec<Record>) =
            self.records.into_iter().partition(Record::is_national);

        (school.into_iter().collect(), national.into_iter().collect())
    }

    /// Every distinct tuple of values for `keys`, mapped to the matching records in
    /// sorted row order.
    pub fn group_by(&self, keys: &[KeyField]) -> BTreeMap<GroupKey, Vec<&Record>> {
        let mut groups: BTreeMap<GroupKey, Vec<&Record>> = BTreeMap::new();
        for rec in self.iter_sorted() {
            groups.entry(group_key(rec, keys)).or_default().push(rec);
        }
        groups
    }

    /// The records matching one tuple of `keys`, in sorted row order.
    pub fn group(&self, keys: &[KeyField], values: &[KeyValue]) -> Vec<&Record> {
        self.iter_sorted()
            .filter(|rec| keys.iter().zip(values).all(|(k, v)| &k.value(rec) == v))
            .collect()
    }

    /// The distinct tuples of values for `keys`.
    pub fn unique_combinations(&self, keys: &[KeyField], order: Order) -> Vec<GroupKey> {
        match order {
            Order::FirstSeen => self
                .records
                .iter()
                .enumerate()
                .sorted_by_key(|&(idx, rec)| (rec.date(), idx))
                .map(|(_, rec)| group_key(rec, keys))
                .unique()
                .collect(),
            Order::Sorted => self.group_by(keys).into_iter().map(|(k, _)| k).collect(),
        }
    }
}

fn group_key(rec: &Record, keys: &[KeyField]) -> GroupKey {
    keys.iter().map(|k| k.value(rec)).collect()
}

impl std::iter::FromIterator<Record> for ForecastTable {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut table = ForecastTable::new();
        for rec in iter {
            table.upsert(rec);
        }
        table
    }
}

impl Extend<Record> for ForecastTable {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        for rec in iter {
            self.upsert(rec);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn rec(name: &str, school: &str, ident: &str, day: u8, date: (i32, u32, u32)) -> Record {
        let date = NaiveDate::from_ymd(date.0, date.1, date.2);
        Record::new(name, school, 3, ident, date, day)
    }

    fn sample() -> ForecastTable {
        vec![
            rec("bob", "tam", "KPDX", 2, (2019, 9, 10)),
            rec("amy", "tam", "KPDX", 1, (2019, 9, 9)),
            rec("amy", "osu", "KPDX", 1, (2019, 9, 9)),
            rec("amy", "tam", "KBOS", 1, (2019, 9, 23)),
            rec("amy", "tam", "KPDX", 2, (2019, 9, 10)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut table = sample();
        let before = table.len();

        let again = rec("amy", "tam", "KPDX", 1, (2019, 9, 9));
        assert_eq!(table.upsert(again.clone()), Upsert::Unchanged);
        assert_eq!(table.len(), before);

        let mut changed = again;
        changed.max = 71;
        assert_eq!(table.upsert(changed.clone()), Upsert::Updated);
        assert_eq!(table.len(), before);
        assert_eq!(table.get(&changed.natural_key()).unwrap().max, 71);
    }

    #[test]
    fn test_query_or_within_and_across() {
        let table = sample();

        let filter = Filter::new().school("TAM").school("osu").name("amy");
        assert_eq!(table.query(&filter).len(), 4);

        let filter = Filter::new().school("osu").year(2019).semester(Semester::Fall);
        assert_eq!(table.query(&filter).len(), 1);

        let filter = Filter::new().semester(Semester::Spring);
        assert!(table.query(&filter).is_empty());
    }

    #[test]
    fn test_group_by_station() {
        let table = sample();
        let groups = table.group_by(&KeyField::STATION);

        assert_eq!(groups.len(), 3);
        let tam_pdx: GroupKey = vec![
            KeyValue::Text("tam".to_owned()),
            KeyValue::Int(2019),
            KeyValue::Semester(Semester::Fall),
            KeyValue::Text("KPDX".to_owned()),
        ];
        let rows = &groups[&tam_pdx];
        let days: Vec<u8> = rows.iter().map(|r| r.day()).collect();
        assert_eq!(days, vec![1, 2, 2]);
        assert_eq!(rows[0].name(), "amy");
        assert_eq!(rows[2].name(), "bob");
        assert_eq!(table.group(&KeyField::STATION, &tam_pdx).len(), 3);
    }

    #[test]
    fn test_unique_combinations_orders() {
        let table = sample();

        let seen = table.unique_combinations(&[KeyField::Identifier], Order::FirstSeen);
        assert_eq!(
            seen,
            vec![
                vec![KeyValue::Text("KPDX".to_owned())],
                vec![KeyValue::Text("KBOS".to_owned())]
            ]
        );

        let sorted = table.unique_combinations(&[KeyField::Identifier], Order::Sorted);
        assert_eq!(sorted[0], vec![KeyValue::Text("KBOS".to_owned())]);
    }

    #[test]
    fn test_partition_national() {
        let mut table = sample();
        table.upsert(Record::new(
            "CLIMO_",
            "xxx",
            8,
            "KPDX",
            NaiveDate::from_ymd(2019, 9, 9),
            1,
        ));

        let (school, national) = table.partition_national();
        assert_eq!(school.len(), 5);
        assert_eq!(national.len(), 1);
    }
}
