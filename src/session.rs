use crate::aggregate::{self, DailyRevenue, Kpis, ProductRevenue, RegionRevenue, StatusCount};
use crate::auth::{Identity, SessionGate, Verdict};
use crate::editor::EditSurface;
use crate::error::{DashError, Result};
use crate::filter::{self, FilterSelection, FilteredView, StatusFilter};
use crate::models::Dataset;
use crate::reconciler::reconcile;
use crate::store::DatasetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    VisualAnalytics,
    DataEditor,
    NewTable,
    DeepDive,
    FromHtml,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Self::VisualAnalytics => "Visual Analytics",
            Self::DataEditor => EditSurface::Validated.title(),
            Self::NewTable => EditSurface::Plain.title(),
            Self::DeepDive => "Deep Dive",
            Self::FromHtml => "From HTML",
        }
    }
}

/// Visible tabs in order. The two editing grids only appear while the
/// editor toggle is on.
pub fn tabs(show_editor: bool) -> Vec<Tab> {
    let mut tabs = vec![Tab::VisualAnalytics, Tab::DeepDive, Tab::FromHtml];
    if show_editor {
        tabs.insert(1, Tab::DataEditor);
        tabs.insert(2, Tab::NewTable);
    }
    tabs
}

/// Settings that change what is rendered but never the data.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub show_editor: bool,
    pub accent_color: String,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Enables the product filter (no-auth variant).
    pub product_filter: bool,
    pub show_editor: bool,
    pub accent_color: String,
    pub top_n: usize,
}

/// One user interaction. Each one leads to at most one full pass.
#[derive(Debug, Clone)]
pub enum Command {
    SetRegions(Vec<String>),
    ToggleRegion(String),
    SetProducts(Vec<String>),
    ToggleProduct(String),
    SetStatus(StatusFilter),
    ToggleEditor,
    SetAccent(String),
    SubmitEdit {
        surface: EditSurface,
        snapshot: Dataset,
    },
    Refresh,
}

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone)]
pub struct DashboardFrame {
    pub view: FilteredView,
    pub kpis: Kpis,
    pub top_products: Vec<ProductRevenue>,
    pub status_counts: Vec<StatusCount>,
    pub revenue_series: Vec<DailyRevenue>,
    pub region_revenue: Vec<RegionRevenue>,
    pub tabs: Vec<Tab>,
    pub revision: u64,
}

impl DashboardFrame {
    pub fn caption(&self) -> String {
        format!("Data snapshot for {} transactions.", self.view.len())
    }
}

/// Per-user state: canonical dataset, current selections and display
/// settings. Created after the gate grants access and dropped at logout.
pub struct Session {
    identity: Identity,
    store: DatasetStore,
    selection: FilterSelection,
    display: DisplaySettings,
    top_n: usize,
    passes: u64,
}

impl Session {
    /// Ask the gate for a verdict and start a session only when granted.
    pub fn begin<G, F>(gate: &mut G, options: SessionOptions, seed: F) -> Result<Self>
    where
        G: SessionGate + ?Sized,
        F: FnOnce() -> Dataset,
    {
        match gate.login() {
            Verdict::Granted(identity) => Ok(Self::start(identity, options, seed)),
            other => Err(DashError::AccessDenied(
                other.message().unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn start<F>(identity: Identity, options: SessionOptions, seed: F) -> Self
    where
        F: FnOnce() -> Dataset,
    {
        let mut store = DatasetStore::new();
        store.initialize_if_absent(seed);
        let selection = match store.get() {
            Ok(dataset) => FilterSelection::select_all(dataset, options.product_filter),
            Err(_) => FilterSelection {
                regions: Vec::new(),
                products: options.product_filter.then(Vec::new),
                status: StatusFilter::All,
            },
        };
        log::info!("session started for '{}'", identity.username);
        Self {
            identity,
            store,
            selection,
            display: DisplaySettings {
                show_editor: options.show_editor,
                accent_color: options.accent_color,
            },
            top_n: options.top_n,
            passes: 0,
        }
    }

    /// Tear the session down. The dataset goes with it.
    pub fn end(self) {
        log::info!(
            "session for '{}' ended after {} passes, {} edits",
            self.identity.username,
            self.passes,
            self.store.revision()
        );
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn canonical(&self) -> Result<&Dataset> {
        self.store.get()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    pub fn product_filter_enabled(&self) -> bool {
        self.selection.products.is_some()
    }

    #[cfg(test)]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Apply one interaction. Returns the new frame, or `None` when nothing
    /// changed and no pass was needed (an edit identical to canonical).
    pub fn dispatch(&mut self, cmd: Command) -> Result<Option<DashboardFrame>> {
        match cmd {
            Command::SetRegions(regions) => self.selection.regions = regions,
            Command::ToggleRegion(region) => toggle(&mut self.selection.regions, region),
            Command::SetProducts(products) => {
                if self.selection.products.is_some() {
                    self.selection.products = Some(products);
                }
            }
            Command::ToggleProduct(product) => {
                if let Some(products) = self.selection.products.as_mut() {
                    toggle(products, product);
                }
            }
            Command::SetStatus(status) => self.selection.status = status,
            Command::ToggleEditor => self.display.show_editor = !self.display.show_editor,
            Command::SetAccent(color) => self.display.accent_color = color,
            Command::SubmitEdit { surface, snapshot } => {
                let canonical = self.store.get()?;
                let known_regions = canonical.distinct_regions();
                let known_products = canonical.distinct_products();
                let outcome = reconcile(canonical, snapshot);
                if !outcome.changed {
                    log::debug!("{} submitted an unchanged snapshot", surface.title());
                    return Ok(None);
                }
                log::info!(
                    "{} edit accepted ({} rows)",
                    surface.title(),
                    outcome.result.len()
                );
                self.store.replace(outcome.result);
                self.admit_new_values(&known_regions, &known_products)?;
            }
            Command::Refresh => {}
        }
        self.run_pass().map(Some)
    }

    /// Select regions and products that first appeared with the last edit.
    /// Values the user deselected earlier stay deselected.
    fn admit_new_values(
        &mut self,
        known_regions: &[String],
        known_products: &[String],
    ) -> Result<()> {
        let canonical = self.store.get()?;
        for region in canonical.distinct_regions() {
            if !known_regions.contains(&region) && !self.selection.region_selected(&region) {
                log::debug!("selecting new region '{region}'");
                self.selection.regions.push(region);
            }
        }
        if let Some(products) = self.selection.products.as_mut() {
            for product in canonical.distinct_products() {
                if !known_products.contains(&product) && !products.contains(&product) {
                    log::debug!("selecting new product '{product}'");
                    products.push(product);
                }
            }
        }
        Ok(())
    }

    /// One full recomputation from canonical dataset to render data.
    pub fn run_pass(&mut self) -> Result<DashboardFrame> {
        let view = filter::apply(self.store.get()?, &self.selection);
        let frame = DashboardFrame {
            kpis: aggregate::kpis(&view),
            top_products: aggregate::top_products_by_revenue(&view, self.top_n),
            status_counts: aggregate::status_distribution(&view),
            revenue_series: aggregate::revenue_by_date(&view),
            region_revenue: aggregate::revenue_by_region(&view),
            tabs: tabs(self.display.show_editor),
            revision: self.store.revision(),
            view,
        };
        self.passes += 1;
        log::debug!("pass {}: {} rows in view", self.passes, frame.view.len());
        Ok(frame)
    }
}

fn toggle(values: &mut Vec<String>, value: String) {
    if let Some(pos) = values.iter().position(|v| *v == value) {
        values.remove(pos);
    } else {
        values.push(value);
    }
}
