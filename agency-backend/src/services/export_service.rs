use crate::error::Result;
use crate::models::candidate::Candidate;
use rust_xlsxwriter::*;

pub struct ExportService;

const COLUMNS: [(&str, f64); 11] = [
    ("#", 6.0),
    ("Name", 28.0),
    ("Email", 30.0),
    ("Mobile", 16.0),
    ("Phone", 16.0),
    ("City", 16.0),
    ("Profession", 30.0),
    ("Status", 14.0),
    ("Source", 14.0),
    ("CV", 40.0),
    ("Created", 18.0),
];

impl ExportService {
    /// Candidate list as a styled XLSX workbook.
    pub fn generate_candidates_xlsx(candidates: &[Candidate]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Candidates")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        for (i, (_, width)) in COLUMNS.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }
        let last_col = (COLUMNS.len() - 1) as u16;

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 36)?;
        let title = format!(
            "Candidates report  •  {}  •  {} total",
            chrono::Utc::now().format("%d.%m.%Y %H:%M UTC"),
            candidates.len()
        );
        worksheet.merge_range(0, 0, 0, last_col, &title, &title_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 1;
        worksheet.set_row_height(header_row, 26)?;
        for (i, (name, _)) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 2;
        for (idx, candidate) in candidates.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let name_fmt = base_fmt.clone().set_bold();

            let or_dash = |v: &Option<String>| {
                v.clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "-".to_string())
            };

            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;
            let name = candidate.full_name();
            worksheet.write_string_with_format(
                row,
                1,
                if name.is_empty() { "-" } else { name.as_str() },
                &name_fmt,
            )?;
            worksheet.write_string_with_format(row, 2, or_dash(&candidate.email), &base_fmt)?;
            worksheet.write_string_with_format(row, 3, or_dash(&candidate.mobile), &center_fmt)?;
            worksheet.write_string_with_format(row, 4, or_dash(&candidate.phone), &center_fmt)?;
            worksheet.write_string_with_format(row, 5, or_dash(&candidate.city), &base_fmt)?;
            worksheet.write_string_with_format(row, 6, or_dash(&candidate.profession), &base_fmt)?;
            worksheet.write_string_with_format(row, 7, &candidate.status, &center_fmt)?;
            let source = or_dash(&candidate.recruitment_source);
            worksheet.write_string_with_format(row, 8, source, &center_fmt)?;
            worksheet.write_string_with_format(row, 9, or_dash(&candidate.cv_path), &base_fmt)?;

            let created = candidate
                .created_at
                .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            worksheet.write_string_with_format(row, 10, &created, &center_fmt)?;
        }

        worksheet.set_freeze_panes(2, 0)?;
        let last_row = (data_start_row + candidates.len() as u32).saturating_sub(1).max(header_row);
        worksheet.autofilter(header_row, 0, last_row, last_col)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(first: &str, email: Option<&str>) -> Candidate {
        Candidate {
            id: uuid::Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: String::new(),
            email: email.map(str::to_string),
            mobile: None,
            phone: None,
            city: None,
            profession: None,
            cv_path: Some("/uploads/cv/x_cv.pdf".to_string()),
            cv_content: None,
            status: "new".to_string(),
            recruitment_source: Some("email".to_string()),
            notes: None,
            created_at: Some(chrono::Utc::now()),
            updated_at: None,
        }
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let bytes = ExportService::generate_candidates_xlsx(&[
            candidate("Dana", Some("dana@example.com")),
            candidate("", None),
        ])
        .unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_export_still_renders() {
        let bytes = ExportService::generate_candidates_xlsx(&[]).unwrap();
        assert!(!bytes.is_empty());
    }
}
