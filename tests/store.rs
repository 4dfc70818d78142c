use chrono::NaiveDate;
use wxgrade::{
    import::{read_forecasts, read_schedule, read_verifications},
    Filter, ForecastStore, GradePolicy, GradingEngine, Semester, UpsertCounts,
};

const FORECASTS: &str = "\
name,school,category,date,identifier,day,abs,max,min,wind,precip,type,err_total,cum_err_total,norm_city
amy,TAM,3,2019-09-09,KPDX,1,0,72,55,10,0.00,H,2.0,2.0,-4.0
amy,TAM,3,2019-09-10,KPDX,2,0,70,54,12,0.05,H,3.0,5.0,-4.0
bob,TAM,3,2019-09-09,KPDX,1,0,80,60,20,0.50,H,20.0,20.0,12.0
bob,TAM,3,2019-09-10,KPDX,2,0,80,60,20,0.50,H,25.0,45.0,12.0
CONSEN,TAM,9,2019-09-09,KPDX,1,0,76,57,15,0.20,H,10.0,10.0,3.0
CONSEN,TAM,9,2019-09-10,KPDX,2,0,75,57,16,0.25,H,10.0,20.0,3.0
CLIMO_,xxx,8,2019-09-09,KPDX,1,0,71,52,8,0.10,C,15.0,15.0,40.0
CLIMO_,xxx,8,2019-09-10,KPDX,2,0,71,52,8,0.10,C,15.0,30.0,40.0
";

const SCHEDULE: &str = "\
city,state,ident,start,end
Portland,OR,KPDX,2019-09-09,2019-09-19
Boston,MA,KBOS,2019-09-23,2019-10-03
Lubbock,TX,KLBB,2020-01-20,2020-01-30
";

const VERIFICATION: &str = "\
city,state,ident,date,max,min,wind,precip
Portland,OR,KPDX,2019-09-09,73,55,11,0.00
Portland,OR,KPDX,2019-09-10,70,53,12,0.04
";

/// Storing the same file twice changes nothing the second time.
#[test]
fn test_idempotent_upsert() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = ForecastStore::open_or_create(tmp.path()).unwrap();

    let parsed = read_forecasts(FORECASTS.as_bytes()).unwrap();
    assert_eq!(parsed.skipped, 0);

    let first = store.upsert_forecasts(&parsed.items).unwrap();
    assert_eq!(first.inserted, 8);

    let second = store.upsert_forecasts(&parsed.items).unwrap();
    assert_eq!(
        second,
        UpsertCounts {
            inserted: 0,
            updated: 0,
            unchanged: 8
        }
    );
    assert_eq!(store.count_forecasts().unwrap(), 8);

    let mut changed = parsed.items[0].clone();
    changed.max = 90;
    let third = store.upsert_forecasts(std::iter::once(&changed)).unwrap();
    assert_eq!(third.updated, 1);
    assert_eq!(store.count_forecasts().unwrap(), 8);

    // Reopening finds the same data.
    drop(store);
    let store = ForecastStore::open_or_create(tmp.path()).unwrap();
    let amy = store
        .query_forecasts(&Filter::new().name("amy"), false)
        .unwrap();
    assert_eq!(amy.len(), 2);
    assert_eq!(amy.get(&changed.natural_key()).unwrap().max, 90);
}

/// School queries and model queries see different rows.
#[test]
fn test_query_school_and_models() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = ForecastStore::open_or_create(tmp.path()).unwrap();
    let parsed = read_forecasts(FORECASTS.as_bytes()).unwrap();
    store.upsert_forecasts(&parsed.items).unwrap();

    let season = Filter::new().semester(Semester::Fall).year(2019);

    let school = store
        .query_forecasts(&season.clone().school("TAM"), false)
        .unwrap();
    assert_eq!(school.len(), 6);
    assert!(school.iter().all(|r| !r.is_national()));

    let models = store
        .query_forecasts(&season.clone().school("TAM").category(3), true)
        .unwrap();
    assert_eq!(models.len(), 2);
    assert!(models.iter().all(|r| r.is_national()));

    let spring = store
        .query_forecasts(&Filter::new().semester(Semester::Spring), false)
        .unwrap();
    assert!(spring.is_empty());
}

/// Schedule entries come back grouped by season, and a missing season is an error.
#[test]
fn test_schedule_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ForecastStore::open_or_create(tmp.path()).unwrap();

    let parsed = read_schedule(SCHEDULE.as_bytes()).unwrap();
    assert_eq!(store.add_schedule(&parsed.items).unwrap(), 3);

    let schedule = store.load_schedule().unwrap();
    let fall: Vec<&str> = schedule
        .season(Semester::Fall, 2019)
        .unwrap()
        .iter()
        .map(|e| e.ident.as_str())
        .collect();
    assert_eq!(fall, vec!["KPDX", "KBOS"]);
    assert_eq!(schedule.season(Semester::Spring, 2020).unwrap().len(), 1);
    assert!(schedule.season(Semester::Spring, 2019).is_err());

    let (entry, day) = schedule
        .ident_day(NaiveDate::from_ymd(2019, 9, 17))
        .unwrap();
    assert_eq!(entry.ident, "KPDX");
    assert_eq!(day, 6);
}

/// A season graded straight from the database.
#[test]
fn test_grade_from_store() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = ForecastStore::open_or_create(tmp.path()).unwrap();

    store
        .upsert_forecasts(&read_forecasts(FORECASTS.as_bytes()).unwrap().items)
        .unwrap();
    store
        .add_schedule(&read_schedule(SCHEDULE.as_bytes()).unwrap().items)
        .unwrap();
    store
        .add_verifications(&read_verifications(VERIFICATION.as_bytes()).unwrap().items)
        .unwrap();

    let schedule = store.load_schedule().unwrap();
    let dates: Vec<NaiveDate> = schedule
        .season(Semester::Fall, 2019)
        .unwrap()
        .iter()
        .flat_map(|e| e.contest_dates())
        .collect();
    let verification = store.verifications(&dates).unwrap();
    assert_eq!(verification.len(), 2);

    let season = Filter::new().semester(Semester::Fall).year(2019);
    let (forecasts, national) = store
        .query_forecasts(&season, false)
        .unwrap()
        .partition_national();
    assert_eq!(national.len(), 2);
    let model = store.query_forecasts(&season, true).unwrap();

    let sheet = GradingEngine::new(GradePolicy::default())
        .with_model(&model)
        .with_verification(&verification)
        .calc_grades(&forecasts);

    assert_eq!(sheet.rows.len(), 2);
    let amy = sheet.rows.iter().find(|r| r.name == "amy").unwrap();
    let bob = sheet.rows.iter().find(|r| r.name == "bob").unwrap();

    // Finals of 5 and 45 against a consensus of 20: amy is 0.75 sd ahead.
    assert_eq!(amy.school_bonus, 1.0);
    assert_eq!(bob.school_bonus, 0.0);
    assert_eq!(amy.national_bonus, 1.4);
    assert_eq!(bob.national_bonus, 0.0);

    // Climatology, far behind the nation, still beat bob on both days.
    assert_eq!(amy.climo_penalty, 0.0);
    assert!((bob.climo_penalty + 10.0).abs() < 1.0e-9);
}
