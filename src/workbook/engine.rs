// ==========================================
// 配置工作簿 - 转换引擎
// ==========================================
// 职责: 整合转换流程，从请求到分组文档
// 流程: 校验 → 提取 → 规整 → 映射解析 → 重映射/过滤/查找 → 分组
// 红线: 单次调用无共享可变状态；相同输入产生相同输出
// ==========================================

use crate::config::{SourcePlan, TransformPlan, WorkbookRequest};
use crate::workbook::aggregator::{aggregate, render, Document, OutputFormat};
use crate::workbook::error::WorkbookResult;
use crate::workbook::field_remapper::FieldRemapper;
use crate::workbook::lookup::{LookupResolver, SpreadsheetDefaults};
use crate::workbook::record_normalizer::normalize_records;
use crate::workbook::schema::{observed_categories, resolve_schema};
use crate::workbook::sheet_reader::ExcelWorkbook;
use crate::workbook::tabular_extractor::extract_sheet;
use crate::workbook::workbook_trait::SheetProvider;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

// ==========================================
// WorkbookEngine - 转换引擎
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkbookEngine;

impl WorkbookEngine {
    pub fn new() -> Self {
        Self
    }

    /// 校验请求并执行转换
    ///
    /// # 参数
    /// - request: 转换请求
    ///
    /// # 返回
    /// - Ok(Document): 分组后的输出文档
    /// - Err: 校验失败（未读取任何数据）或数据源读取/解析失败
    pub fn transform(&self, request: &WorkbookRequest) -> WorkbookResult<Document> {
        let plan = request.validate().map_err(|e| {
            error!(error = %e, "请求校验失败");
            e
        })?;
        self.run(&plan)
    }

    /// 执行转换并序列化
    pub fn transform_to_string(
        &self,
        request: &WorkbookRequest,
        format: OutputFormat,
    ) -> WorkbookResult<String> {
        let document = self.transform(request)?;
        render(&document, format)
    }

    /// 按已校验的计划执行转换（工作簿数据源从磁盘读取）
    pub fn run(&self, plan: &TransformPlan) -> WorkbookResult<Document> {
        match &plan.source {
            SourcePlan::Delimited(_) => self.execute(plan, None),
            SourcePlan::Spreadsheet(source) => {
                let workbook = ExcelWorkbook::new(&source.path, source.password.clone());
                self.execute(plan, Some(&workbook as &dyn SheetProvider))
            }
        }
    }

    /// 按已校验的计划执行转换，工作簿数据源由调用方提供
    ///
    /// 分隔文本数据源时 provider 只用于工作表查找表。
    pub fn run_with_provider(
        &self,
        plan: &TransformPlan,
        provider: &dyn SheetProvider,
    ) -> WorkbookResult<Document> {
        self.execute(plan, Some(provider))
    }

    #[instrument(skip_all, fields(category_column = %plan.category_column))]
    fn execute(
        &self,
        plan: &TransformPlan,
        provider: Option<&dyn SheetProvider>,
    ) -> WorkbookResult<Document> {
        let start_time = Instant::now();

        // === 步骤 1: 提取分隔文本 ===
        let (text, defaults) = match (&plan.source, provider) {
            (SourcePlan::Delimited(text), _) => {
                debug!("步骤 1: 使用内联分隔文本");
                let defaults = SpreadsheetDefaults {
                    provider,
                    ..SpreadsheetDefaults::default()
                };
                (text.clone(), defaults)
            }
            (SourcePlan::Spreadsheet(source), Some(provider)) => {
                debug!(source = %provider.describe(), worksheet = %source.worksheet, "步骤 1: 提取工作表");
                let text = extract_sheet(provider, &source.worksheet, &source.extract).map_err(|e| {
                    error!(error = %e, "工作表提取失败");
                    e
                })?;
                let defaults = SpreadsheetDefaults {
                    provider: Some(provider),
                    password: source.password.clone(),
                    worksheet: Some(source.worksheet.clone()),
                };
                (text, defaults)
            }
            (SourcePlan::Spreadsheet(source), None) => {
                let workbook = ExcelWorkbook::new(&source.path, source.password.clone());
                return self.execute(plan, Some(&workbook as &dyn SheetProvider));
            }
        };

        // === 步骤 2: 规整为记录 ===
        let records = normalize_records(&text)?;
        info!(records = records.len(), "记录规整完成");

        // === 步骤 3: 解析映射 ===
        let schema = resolve_schema(
            plan.schema.as_deref(),
            &records,
            &plan.category_column,
            &plan.default_category,
        )?;
        let categories = observed_categories(&records, &plan.category_column);
        debug!(categories = ?categories, "观察到的分类值");

        // === 步骤 4: 重映射、过滤、查找 ===
        let remapper = FieldRemapper::new(
            schema,
            plan.category_column.as_str(),
            plan.filters.clone(),
            LookupResolver::new(plan.lookups.clone(), defaults),
        );
        let output = remapper.remap(&records);

        // === 步骤 5: 分组 ===
        let document = aggregate(output, &categories, &plan.category_column, &plan.default_category);

        info!(
            groups = document.len(),
            records = document.record_count(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "转换完成"
        );
        Ok(document)
    }
}
