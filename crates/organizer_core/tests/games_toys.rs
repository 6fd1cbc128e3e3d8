use chrono::{Duration, TimeZone, Utc};
use organizer_core::db::open_db_in_memory;
use organizer_core::model::game::GameMetadata;
use organizer_core::service::game_service::{GameError, GameFilter, GameInput};
use organizer_core::service::toy_service::{ToyCarFilter, ToyCarInput, ToyError};
use organizer_core::{GameService, GameStatus, SqliteKvStore, ToyService};

#[test]
fn game_crud_keeps_metadata_and_orders_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = GameService::new(SqliteKvStore::new(&conn));
    let earlier = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

    let metadata = GameMetadata {
        id: 58175,
        name: "God of War".to_string(),
        platforms: vec!["PlayStation 4".to_string(), "PC".to_string()],
        ..GameMetadata::default()
    };
    let gow = service
        .add_game(GameInput::from_metadata(metadata), earlier)
        .unwrap();
    assert_eq!(gow.platform, "PC");
    let celeste = service
        .add_game(
            GameInput::new("Celeste", "Nintendo Switch", GameStatus::Finished).with_rating(5),
            earlier + Duration::days(1),
        )
        .unwrap();

    let updated = service
        .update_game(
            gow.id,
            GameInput::new("God of War", "PlayStation 5", GameStatus::Playing),
        )
        .unwrap();
    assert_eq!(updated.platform, "PlayStation 5");
    assert_eq!(updated.metadata.as_ref().map(|m| m.id), Some(58175));

    let view = service.view(&GameFilter::default()).unwrap();
    assert_eq!(view.items[0].id, celeste.id);
    assert_eq!(view.stats.total, 2);
    assert_eq!(view.stats.playing, 1);
    assert_eq!(view.stats.finished, 1);

    service.delete_game(celeste.id).unwrap();
    assert!(matches!(
        service.delete_game(celeste.id),
        Err(GameError::NotFound(_))
    ));
}

#[test]
fn game_validation_rejects_blank_title_and_bad_rating() {
    let conn = open_db_in_memory().unwrap();
    let service = GameService::new(SqliteKvStore::new(&conn));

    assert!(matches!(
        service.add_game(GameInput::new("  ", "PC", GameStatus::Backlog), Utc::now()),
        Err(GameError::Validation(_))
    ));
    assert!(matches!(
        service.add_game(
            GameInput::new("Hades", "PC", GameStatus::Backlog).with_rating(6),
            Utc::now()
        ),
        Err(GameError::Validation(_))
    ));
    assert!(service.games().unwrap().is_empty());
}

#[test]
fn game_export_uses_stored_labels() {
    let conn = open_db_in_memory().unwrap();
    let service = GameService::new(SqliteKvStore::new(&conn));
    service
        .add_game(
            GameInput::new("Hades", "PC", GameStatus::Paused),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();

    let csv = service.export_csv().unwrap();
    assert_eq!(
        csv.lines().nth(1),
        Some("\"Hades\",\"PC\",\"Pausado\",\"\",\"01/02/2024\"")
    );

    let filter = GameFilter {
        status: Some(GameStatus::Paused),
        ..GameFilter::default()
    };
    assert_eq!(service.view(&filter).unwrap().items.len(), 1);
}

#[test]
fn toy_numbers_are_unique_on_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let service = ToyService::new(SqliteKvStore::new(&conn));
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

    let skyline = service
        .add_car(
            ToyCarInput::new("Nissan Skyline GT-R", "HW-12", 2020).with_series("HW J-Imports"),
            now,
        )
        .unwrap();
    let supra = service
        .add_car(ToyCarInput::new("Toyota Supra", "HW-15", 2021), now)
        .unwrap();

    assert!(matches!(
        service.add_car(ToyCarInput::new("Another", "hw-12", 2022), now),
        Err(ToyError::DuplicateNumber(_))
    ));
    assert!(matches!(
        service.update_car(supra.id, ToyCarInput::new("Toyota Supra", "HW-12", 2021)),
        Err(ToyError::DuplicateNumber(_))
    ));

    let renamed = service
        .update_car(
            skyline.id,
            ToyCarInput::new("Skyline R34", "HW-12", 2020).with_series("HW J-Imports"),
        )
        .unwrap();
    assert_eq!(renamed.name, "Skyline R34");
}

#[test]
fn toy_view_filters_by_series_and_reports_stats() {
    let conn = open_db_in_memory().unwrap();
    let service = ToyService::new(SqliteKvStore::new(&conn));
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    for (name, number, year, series) in [
        ("Skyline", "1/250", 2020, Some("HW J-Imports")),
        ("Civic", "2/250", 2021, Some("HW J-Imports")),
        ("Mustang", "3/250", 2021, Some("Muscle Mania")),
        ("Beetle", "4/250", 2019, None),
    ] {
        let mut input = ToyCarInput::new(name, number, year);
        if let Some(series) = series {
            input = input.with_series(series);
        }
        service.add_car(input, now).unwrap();
    }

    assert_eq!(
        service.series().unwrap(),
        vec!["HW J-Imports".to_string(), "Muscle Mania".to_string()]
    );

    let all = service.view(&ToyCarFilter::default()).unwrap();
    assert_eq!(all.stats.total, 4);
    assert_eq!(all.stats.distinct_series, 2);
    assert_eq!(all.stats.most_common_year, Some(2021));

    let imports = service
        .view(&ToyCarFilter {
            series: Some("HW J-Imports".to_string()),
            search: "civ".to_string(),
        })
        .unwrap();
    assert_eq!(imports.items.len(), 1);
    assert_eq!(imports.items[0].name, "Civic");

    let csv = service.export_csv().unwrap();
    assert!(csv.starts_with("Nome,Número,Ano,Série,Data Adicionado\n"));
    assert!(csv.contains("\"Beetle\",\"4/250\",\"2019\",\"\",\"01/05/2024\""));
}
