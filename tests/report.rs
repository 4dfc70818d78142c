use chrono::{Duration, NaiveDate};
use wxgrade::{
    calc_trends, most_improved, ForecastTable, ForecastType, GradeRow, Record, Report, Roster,
    Semester, Station, ALL_CLASS, FINAL_GRADES,
};

const ROSTER: &str = "\
forecaster_id,first_name,last_name,class_id_1,class_id_2
jdoe,Jane,Doe,METR 101,METR 440
bsmith,Bob,Smith,METR 101,No Class ID
cwu,Chen,Wu,No Class ID,No Class ID
";

fn grade(name: &str, ident: &str, score: f64) -> GradeRow {
    GradeRow {
        station: Station {
            school: "tam".to_owned(),
            year: 2019,
            semester: Semester::Fall,
            identifier: ident.to_owned(),
        },
        category: 3,
        name: name.to_owned(),
        forecasts: 8,
        absence_penalty: score - 100.0,
        vacation_exempt: 0,
        climo_penalty: 0.0,
        school_bonus: 0.5,
        national_bonus: 0.75,
        score,
    }
}

/// A student in two classes shows up, independently, on both class sheets.
#[test]
fn test_student_in_two_classes() {
    let roster = Roster::from_reader(ROSTER.as_bytes()).unwrap();
    let rows = vec![
        grade("jdoe", "KPDX", 100.0),
        grade("bsmith", "KPDX", 50.0),
        grade("cwu", "KPDX", 83.33),
    ];

    let mut report = Report::build(&rows, &roster);
    let classes: Vec<&str> = report.classes.iter().map(|c| c.class.as_str()).collect();
    assert_eq!(classes, vec!["METR 101", "METR 440", ALL_CLASS]);

    let in_101 = report.class("METR 101").unwrap().city("KPDX").unwrap();
    let in_440 = report.class("METR 440").unwrap().city("KPDX").unwrap();
    let names: Vec<&str> = in_101.rows.iter().map(|r| r.last_name.as_str()).collect();
    assert_eq!(names, vec!["Doe", "Smith"]);
    assert_eq!(in_440.rows.len(), 1);
    assert_eq!(in_440.rows[0], in_101.rows[0]);

    // Changing one class sheet leaves the other alone.
    report.classes[1].cities[0].rows[0].score = 0.0;
    let in_101 = report.class("METR 101").unwrap().city("KPDX").unwrap();
    assert_eq!(in_101.rows[0].score, 100.0);

    let all = report.class(ALL_CLASS).unwrap();
    assert_eq!(all.city("KPDX").unwrap().rows.len(), 3);
    assert_eq!(all.final_grades.len(), 3);
}

/// Each class gets its own directory of city sheets and a final grades sheet.
#[test]
fn test_write_csv() {
    let roster = Roster::from_reader(ROSTER.as_bytes()).unwrap();
    let rows = vec![
        grade("jdoe", "KPDX", 100.0),
        grade("jdoe", "KBOS", 90.0),
        grade("bsmith", "KPDX", 50.0),
    ];
    let report = Report::build(&rows, &roster);

    let tmp = tempfile::tempdir().unwrap();
    let written = report.write_csv(tmp.path()).unwrap();
    assert_eq!(written.len(), 9);

    let final_path = tmp
        .path()
        .join("METR_101")
        .join(format!("{}.csv", FINAL_GRADES));
    assert!(written.contains(&final_path));

    let mut rdr = csv::Reader::from_path(&final_path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Doe");
    assert_eq!(&rows[0][2], "2");
    assert_eq!(&rows[0][5], "95.00");

    assert!(tmp.path().join("METR_440").join("KBOS.csv").exists());
}

/// The student whose errors fell the most consistently is the most improved.
#[test]
fn test_most_improved() {
    let roster = Roster::from_reader(ROSTER.as_bytes()).unwrap();
    let start = NaiveDate::from_ymd(2019, 9, 9);

    let mut forecasts = ForecastTable::new();
    for day in 0..8u8 {
        let date = start + Duration::days(i64::from(day));
        let errors = [("jdoe", 10.0 - f64::from(day)), ("bsmith", 2.0 + f64::from(day % 3))];
        for &(name, err) in errors.iter() {
            let mut rec = Record::new(name, "tam", 3, "KPDX", date, day + 1);
            rec.fcst_type = ForecastType::Human;
            rec.err.total = err;
            forecasts.upsert(rec);
        }
    }

    let trends = calc_trends(&forecasts, &roster, Semester::Fall, 2019);
    assert_eq!(trends.len(), 2);
    assert_eq!(trends[0].forecaster_id, "jdoe");
    assert_eq!(trends[0].days, 8);

    let best = most_improved(&trends).unwrap();
    assert_eq!(best.forecaster_id, "jdoe");
    assert!((best.fit.r + 1.0).abs() < 1.0e-9);
}
