use super::*;

#[test]
fn export_paths_and_names() {
    assert_eq!(ExportFormat::Xlsx.path(), "/reportes/export/xlsx/");
    assert_eq!(ExportFormat::Pdf.file_name("global"), "reporte_global.pdf");
    assert_eq!(ExportFormat::Csv.file_name("mes"), "reporte_mes.csv");
}

#[test]
fn export_format_parses_case_insensitively() {
    assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
    assert!("docx".parse::<ExportFormat>().is_err());
}

#[test]
fn summary_paths() {
    assert_eq!(Summary::ByStatus.path(), "/reportes/eventos-por-estado/");
    assert_eq!(Summary::ByUser.path(), "/reportes/eventos-por-usuarios/");
}
