use canada_immigration::config::{AppConfig, SourceSchema};
use canada_immigration::data::{DataLoader, NormalizeError, Normalizer};
use canada_immigration::pipeline::{self, PipelineError};
use canada_immigration::report::render_report;
use canada_immigration::stats::Aggregator;
use std::io::Write;
use std::path::Path;

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn config_for(path: &Path, first_year: i32, last_year: i32) -> AppConfig {
    AppConfig {
        source: SourceSchema {
            path: path.to_path_buf(),
            sheet: None,
            first_year,
            last_year,
            ..SourceSchema::default()
        },
        ..AppConfig::default()
    }
}

const SMALL: &str = "\
Type,Coverage,OdName,AREA,AreaName,REG,RegName,DEV,DevName,1980,1981
Immigrants,Foreigners,India,935,Asia,5501,Southern Asia,902,Developing regions,8880,8670
Immigrants,Foreigners,World,999,World,999,World,999,World,99999,99999
Immigrants,Foreigners,France,908,Europe,924,Western Europe,901,Developed regions,1729,2027
";

#[test]
fn sentinel_rows_are_removed_end_to_end() {
    let file = write_csv(SMALL);
    let config = config_for(file.path(), 1980, 1981);

    let analysis = pipeline::run(&config).unwrap();
    assert_eq!(analysis.records.len(), 4);
    assert!(analysis.records.iter().all(|r| r.country != "World"));

    let totals = &analysis.summary.country_totals;
    assert_eq!(totals.len(), 2);
    assert_eq!(totals.get(&"India".to_string()), Some(17550));
    assert_eq!(totals.get(&"France".to_string()), Some(3756));
    assert_eq!(totals.total(), 8880 + 8670 + 1729 + 2027);
    assert_eq!(analysis.summary.kpis.total_immigrants, totals.total());
}

#[test]
fn padded_sentinel_names_do_not_leak_into_totals() {
    let file = write_csv(
        "OdName,AreaName,RegName,DevName,1980,1981\n\
         India,Asia,Southern Asia,Developing regions,8880,8670\n\
         World ,World,World,World,1000,1000\n\
         \" Unknown\",World,World,World,1000,1000\n",
    );
    let config = config_for(file.path(), 1980, 1981);
    let summary = pipeline::run(&config).unwrap().summary;

    assert_eq!(summary.country_totals.len(), 1);
    assert_eq!(summary.kpis.total_immigrants, 8880 + 8670);
}

#[test]
fn rows_without_a_country_are_dropped() {
    let file = write_csv(
        "OdName,AreaName,RegName,DevName,1980\n\
         India,Asia,Southern Asia,Developing regions,8880\n\
         ,Asia,Southern Asia,Developing regions,500\n",
    );
    let config = config_for(file.path(), 1980, 1980);
    let analysis = pipeline::run(&config).unwrap();

    assert_eq!(analysis.records.len(), 1);
    assert_eq!(analysis.records[0].country, "India");
    assert_eq!(analysis.summary.kpis.total_immigrants, 8880);
}

#[test]
fn heatmap_pivot_covers_the_top_countries() {
    let file = write_csv(
        "OdName,AreaName,RegName,DevName,1980,1981\n\
         India,Asia,Southern Asia,Developing regions,8880,8670\n\
         Peru,Latin America,South America,Developing regions,0,456\n\
         China,Asia,Eastern Asia,Developing regions,5123,0\n",
    );
    let mut config = config_for(file.path(), 1980, 1981);
    config.analysis.heatmap_countries = 2;
    let summary = pipeline::run(&config).unwrap().summary;
    let heatmap = &summary.heatmap;

    assert_eq!(heatmap.rows(), ["China", "India"]);
    assert_eq!(heatmap.columns(), [1980, 1981]);
    assert!(heatmap.row(&"Peru".to_string()).is_none());
    assert_eq!(heatmap.get(&"China".to_string(), &1981), Some(0));

    let flat = heatmap.flatten();
    assert_eq!(flat.len(), 4);
    let flat_sum: u64 = flat.iter().map(|(_, _, v)| v).sum();
    assert_eq!(flat_sum, 8880 + 8670 + 5123);
    assert_eq!(heatmap.total(), flat_sum);
}

#[test]
fn placeholder_text_in_a_year_column_is_a_coercion_error() {
    let file = write_csv(
        "OdName,AreaName,RegName,DevName,1980,1981\n\
         India,Asia,Southern Asia,Developing regions,8880,8670\n\
         Fiji,Oceania,Melanesia,Developing regions,36,..\n",
    );
    let config = config_for(file.path(), 1980, 1981);

    let err = pipeline::run(&config).unwrap_err();
    match err {
        PipelineError::Normalize(NormalizeError::TypeCoercion { column, row, value }) => {
            assert_eq!(column, "1981");
            assert_eq!(row, 1);
            assert_eq!(value, "..");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tidy_records_respect_the_schema() {
    let file = write_csv(SMALL);
    let config = config_for(file.path(), 1980, 1981);
    let analysis = pipeline::run(&config).unwrap();

    for record in &analysis.records {
        assert!(config.source.years().contains(&record.year));
        assert!(!config.source.sentinels.contains(&record.country));
    }
    let sum: u64 = analysis.records.iter().map(|r| r.immigrants).sum();
    assert_eq!(Aggregator::yearly_totals(&analysis.records).total(), sum);
    assert_eq!(analysis.summary.region_year_matrix.total(), sum);
}

#[test]
fn normalizing_is_repeatable() {
    let file = write_csv(SMALL);
    let config = config_for(file.path(), 1980, 1981);
    let table = DataLoader::load(file.path(), &config.source).unwrap();

    let first = Normalizer::normalize(&table, &config.source).unwrap();
    let second = Normalizer::normalize(&table, &config.source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn growth_follows_percent_change() {
    let file = write_csv(
        "OdName,AreaName,RegName,DevName,1980,1981,1982\n\
         X,Asia,Southern Asia,Developing regions,100,150,0\n\
         Y,Asia,Southern Asia,Developing regions,0,40,20\n",
    );
    let config = config_for(file.path(), 1980, 1982);
    let summary = pipeline::run(&config).unwrap().summary;

    let x = "X".to_string();
    let y = "Y".to_string();
    assert_eq!(summary.growth.get(&x, &1981), Some(50.0));
    assert_eq!(summary.growth.get(&x, &1980), None);
    assert_eq!(summary.growth.get(&x, &1982), Some(-100.0));
    // Previous value 0: undefined rather than infinite.
    assert_eq!(summary.growth.get(&y, &1981), None);
    assert_eq!(summary.growth.get(&y, &1982), Some(-50.0));
}

#[test]
fn missing_year_column_fails_in_the_load_stage() {
    let file = write_csv(SMALL);
    let config = config_for(file.path(), 1980, 1982);

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Load(_)));
    assert!(err.to_string().contains("load stage"));
}

#[test]
fn negative_count_fails_in_the_normalize_stage() {
    let file = write_csv(
        "OdName,AreaName,RegName,DevName,1980\n\
         India,Asia,Southern Asia,Developing regions,-5\n",
    );
    let config = config_for(file.path(), 1980, 1980);

    let err = pipeline::run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Normalize(_)));
}

#[test]
fn report_renders_from_a_csv_source() {
    let file = write_csv(SMALL);
    let config = config_for(file.path(), 1980, 1981);
    let summary = pipeline::run(&config).unwrap().summary;

    let text = render_report(&summary, 10);
    assert!(text.starts_with("Total immigrants to Canada (1980-1981): 21,306\n"));
    assert!(text.contains("Top 2 source countries:"));
}
