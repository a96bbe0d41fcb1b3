use anyhow::Result;
use food_drive_report::core::dataset::{DatasetColumn, DatasetHandle, TextEncoding};
use food_drive_report::{LocalStorage, ReportEngine, ReportError, TomlConfig};
use tempfile::TempDir;

const HEADER: &str = "Timestamp,Drop Off Location,City,Stake,Route Number/Name,# of Adult Volunteers in this route,# of Youth Volunteers in this route,# of Donation Bags Collected/Route,Time Spent Collecting Donations,Did you complete more than 1 route?,Number of routes completed,# of Doors in Route";

fn latin1_dataset() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(HEADER.as_bytes());
    bytes.push(b'\n');
    // "Montréal Stake" written as a single Latin-1 byte for é.
    bytes.extend_from_slice(b"9/21/2024 09:05:00,North Chapel,Edmonton,Montr\xE9al,Route 3,4,2,30,60,No,1,110\n");
    bytes.extend_from_slice(b"9/21/2024 13:30:00,South Chapel,Edmonton,Gateway,Route 9,8,6,55,120,Yes,2,260\n");
    bytes.extend_from_slice(b"9/22/2024 10:00:00,South Chapel,Edmonton,Gateway,Route 10,,,12,,No,1,80\n");
    bytes
}

fn storage(dir: &TempDir) -> LocalStorage {
    LocalStorage::new(dir.path().to_string_lossy().to_string())
}

#[tokio::test]
async fn test_dataset_loads_lazily_once() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("Food_Drive_2024.csv"), latin1_dataset())?;

    let handle = DatasetHandle::new(storage(&dir), "Food_Drive_2024.csv", TextEncoding::Latin1);
    assert!(!handle.is_loaded());

    let table = handle.init().await?;
    assert!(handle.is_loaded());
    assert_eq!(table.len(), 3);
    assert_eq!(table.records()[0].stake, "Montréal");
    assert_eq!(table.column(DatasetColumn::DonationBagsCollected), vec![30.0, 55.0, 12.0]);
    assert_eq!(table.column(DatasetColumn::AdultVolunteers), vec![4.0, 8.0]);

    // Later calls share the same table even if the file goes away.
    std::fs::remove_file(dir.path().join("Food_Drive_2024.csv"))?;
    let again = handle.init().await?;
    assert!(std::sync::Arc::ptr_eq(&table, &again));
    Ok(())
}

#[tokio::test]
async fn test_explore_renders_histograms() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("Food_Drive_2024.csv"), latin1_dataset())?;

    let engine = ReportEngine::new(storage(&dir), TomlConfig::default())?;
    let text = engine.explore(20).await?;

    assert!(text.contains("Exploratory Data Analysis"));
    assert!(text.contains("Records: 3"));
    assert!(text.contains("Collected: 2024-09-21 09:05 to 2024-09-22 10:00"));
    assert!(text.contains("Adult Volunteers (n = 2)"));
    assert!(text.contains("Youth Volunteers (n = 2)"));
    assert!(text.contains("Donation Bags Collected (n = 3)"));
    assert!(text.contains("Time to Complete (n = 2)"));
    Ok(())
}

#[tokio::test]
async fn test_explore_without_dataset_fails() {
    let dir = TempDir::new().unwrap();
    let engine = ReportEngine::new(storage(&dir), TomlConfig::default()).unwrap();

    let err = engine.explore(20).await.unwrap_err();
    assert!(matches!(err, ReportError::IoError(_)));
    assert!(!engine.dataset().is_loaded());
}

#[test]
fn test_static_views() {
    let dir = TempDir::new().unwrap();
    let engine = ReportEngine::new(storage(&dir), TomlConfig::default()).unwrap();

    let dashboard = engine.dashboard();
    assert!(dashboard.contains("Abstract"));
    assert!(dashboard.contains("4. Neighbourhood Mapping (coming soon)"));
    assert!(dashboard.contains("5. Data Collection"));
    assert!(engine.mapping().contains("not available yet"));
    assert!(engine.collect().contains("https://forms.gle/rhuMXa2bLwsaWyKg7"));
}
