use chrono::{Days, Local, NaiveDate};
use crm::config::{CLIENTS_FILENAME, EVENTS_FILENAME, SALES_FILENAME};
use crm::{export_report, ClientDraft, CrmError, DataPaths, Session};
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("crm-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn draft(name: &str, email: &str, signup_date: &str, active: &str) -> ClientDraft {
    ClientDraft {
        name: name.into(),
        email: email.into(),
        signup_date: signup_date.into(),
        active: active.into(),
    }
}

#[test]
fn session_starts_unloaded() {
    let session = Session::new(DataPaths::new(scratch_dir("unloaded")));
    assert!(session.dataset().is_none());
}

#[test]
fn appended_client_survives_reload() {
    let dir = scratch_dir("roundtrip");
    let mut session = Session::new(DataPaths::new(&dir));

    let first = session
        .create_client(draft("Ana", "ana@example.com", "2024-01-05", "1"))
        .unwrap();
    let second = session
        .create_client(draft("Luis Gil", "luis@example.org", "2023-12-31", "n"))
        .unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    let contents = fs::read_to_string(dir.join(CLIENTS_FILENAME)).unwrap();
    assert_eq!(
        contents,
        "id;nombre;email;fecha_alta;activo\n\
         1;Ana;ana@example.com;2024-01-05;1\n\
         2;Luis Gil;luis@example.org;2023-12-31;0\n"
    );

    let dataset = session.load().unwrap();
    assert_eq!(dataset.clients(), &[first, second]);
}

#[test]
fn append_after_unterminated_last_row() {
    let dir = scratch_dir("unterminated");
    fs::write(
        dir.join(CLIENTS_FILENAME),
        "id;nombre;email;fecha_alta;activo\n7;Eva;eva@example.com;2024-02-01;1",
    )
    .unwrap();
    let mut session = Session::new(DataPaths::new(&dir));

    let client = session
        .create_client(draft("Noa", "noa@example.com", "2024-02-02", "1"))
        .unwrap();
    assert_eq!(client.id, 8);

    let dataset = session.load().unwrap();
    let ids: Vec<u32> = dataset.clients().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![7, 8]);
}

#[test]
fn rejected_client_leaves_file_untouched() {
    let dir = scratch_dir("rejected");
    let mut session = Session::new(DataPaths::new(&dir));

    let result = session.create_client(draft("Ana", "not-an-email", "2024-01-05", "1"));
    assert!(matches!(result, Err(CrmError::InvalidEmail(_))));
    let result = session.create_client(draft("Ana", "ana@example.com", "2024-13-05", "1"));
    assert!(matches!(result, Err(CrmError::InvalidDate(_))));
    assert!(!dir.join(CLIENTS_FILENAME).exists());
}

#[test]
fn created_client_joins_loaded_dataset() {
    let dir = scratch_dir("live");
    fs::write(
        dir.join(CLIENTS_FILENAME),
        "id;nombre;email;fecha_alta;activo\n7;Eva;eva@example.com;2024-02-01;1\n",
    )
    .unwrap();
    let mut session = Session::new(DataPaths::new(&dir));
    session.load().unwrap();

    let client = session
        .create_client(draft("Noa", "noa@example.com", "2024-02-02", "yes"))
        .unwrap();
    assert_eq!(client.id, 8);
    let dataset = session.dataset().unwrap();
    assert_eq!(dataset.clients().len(), 2);
    assert_eq!(dataset.client_name(8), "Noa");
}

#[test]
fn reload_replaces_previous_dataset() {
    let dir = scratch_dir("reload");
    let events = dir.join(EVENTS_FILENAME);
    fs::write(&events, "1;Concert;Music;2030-01-01;50\n").unwrap();

    let mut session = Session::new(DataPaths::new(&dir));
    assert_eq!(session.load().unwrap().events().len(), 1);

    fs::write(&events, "2;Play;Theatre;2030-01-01;20\n3;Match;Sport;2030-02-01;15\n").unwrap();
    let dataset = session.load().unwrap();
    assert_eq!(dataset.events().len(), 2);
    assert!(dataset.event(1).is_none());
    assert_eq!(dataset.event_name(3), "Match");
}

#[test]
fn load_and_export_pipeline() {
    let dir = scratch_dir("pipeline");
    let today = Local::now().date_naive();
    let in_five = today + Days::new(5);
    let fmt = |d: NaiveDate| d.format("%Y-%m-%d").to_string();

    fs::write(
        dir.join(CLIENTS_FILENAME),
        "id;nombre;email;fecha_alta;activo\n1;Ana;ana@example.com;2024-01-05;1\n",
    )
    .unwrap();
    fs::write(
        dir.join(EVENTS_FILENAME),
        format!("id;nombre;categoria;fecha_evento;precio\n1;Concert;Music;{};50.0\n", fmt(in_five)),
    )
    .unwrap();
    fs::write(
        dir.join(SALES_FILENAME),
        format!(
            "id;cliente_id;evento_id;fecha_venta;unidades;precio_unitario\n1;1;1;{};2;50.0\nbroken row\n",
            fmt(today)
        ),
    )
    .unwrap();

    let mut session = Session::new(DataPaths::new(&dir));
    session.load().unwrap();
    let dataset = session.dataset().unwrap();
    assert_eq!(dataset.sales().len(), 1);

    let stats = dataset.statistics(today);
    assert_eq!(stats.total_revenue, dec!(100.0));
    assert_eq!(stats.revenue_per_event.get(&1), Some(&dec!(100.0)));
    assert_eq!(stats.days_to_nearest_event, Some(5));

    let report = session.paths().report();
    fs::write(&report, "stale contents\n").unwrap();
    let rows = export_report(dataset.events(), dataset.sales(), &report).unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "evento_id;nombre_evento;ingresos_totales\n1;Concert;100.00\n"
    );
}
