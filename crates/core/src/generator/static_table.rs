//! Pre-authored reports, one per soil type.

use super::ReportGenerator;
use crate::error::{GenerationError, GenerationResult};
use crate::report::ReportRequest;
use agrihealth_types::{NonEmptyText, SoilType};
use async_trait::async_trait;

/// Returned for any soil type the table does not cover.
pub const FALLBACK_REPORT: &str = "No specific information available for this soil type. Please contact our agricultural experts for personalized advice.";

const CLAY_REPORT: &str = "\
## Clay Soil Analysis Report

**Soil Composition:**
Clay soil consists of very fine mineral particles and not much organic material. The particles bind together tightly, creating a heavy soil that holds water well but drains poorly.

**Key Characteristics:**
- High in nutrients
- Retains moisture well
- Poor drainage
- Slow to warm in spring
- Compacts easily when wet

**Recommended Crops:**
- Brassicas (cabbage, broccoli)
- Summer vegetables (beans, peas)
- Perennial flowers
- Late-season crops

**Improvement Strategies:**
1. Add organic matter regularly (compost, aged manure)
2. Avoid walking on wet clay soil
3. Raised beds can improve drainage
4. Add coarse sand or fine gravel to improve structure
5. Consider deep-rooted cover crops to break up the soil

**Optimal pH Range:** 6.0-7.0

**Fertilizer Recommendations:**
Focus on balanced NPK fertilizers, with additional phosphorus to encourage root growth. Avoid excessive nitrogen which can lead to lush foliage but poor fruit production.";

const SANDY_REPORT: &str = "\
## Sandy Soil Analysis Report

**Soil Composition:**
Sandy soil consists of large particles with significant space between them, resulting in quick drainage and low nutrient retention.

**Key Characteristics:**
- Drains quickly
- Warms up quickly in spring
- Low in nutrients
- Low water retention
- Easy to work with

**Recommended Crops:**
- Root vegetables (carrots, radishes, potatoes)
- Drought-resistant plants
- Mediterranean herbs (rosemary, thyme)
- Bulbs
- Asparagus

**Improvement Strategies:**
1. Add organic matter frequently (compost, manure)
2. Use mulch to retain moisture
3. Add clay or vermiculite to improve water retention
4. Consider more frequent but lighter watering
5. Use cover crops to prevent erosion

**Optimal pH Range:** 5.5-7.0

**Fertilizer Recommendations:**
Use slow-release fertilizers to prevent leaching. Consider organic options that improve soil structure while adding nutrients. Frequent light applications work better than infrequent heavy ones.";

const LOAM_REPORT: &str = "\
## Loam Soil Analysis Report

**Soil Composition:**
Loam is an ideal soil that contains a balanced mixture of clay, sand, and silt particles, along with organic matter. This creates a soil with excellent structure.

**Key Characteristics:**
- Good drainage
- Retains moisture well
- Rich in nutrients
- Easy to work with
- Warms up reasonably in spring

**Recommended Crops:**
- Almost all garden vegetables
- Fruit trees
- Berries
- Annual flowers
- Most perennials

**Improvement Strategies:**
1. Maintain organic matter content with regular compost additions
2. Use cover crops in the off-season to build soil
3. Practice crop rotation
4. Minimal tilling to preserve soil structure
5. Add balanced fertilizers as needed

**Optimal pH Range:** 6.0-7.0

**Fertilizer Recommendations:**
Typically requires modest fertilization. Conduct annual soil tests to monitor nutrient levels and adjust accordingly. Focus on maintaining the excellent natural balance of this soil type.";

const SILT_REPORT: &str = "\
## Silty Soil Analysis Report

**Soil Composition:**
Silty soil contains mainly silt particles, which are smaller than sand but larger than clay. It has a smooth, sometimes slick texture when wet.

**Key Characteristics:**
- Retains moisture well
- Rich in nutrients
- Poor drainage when compacted
- Can form a crust when dry
- Moderate warming in spring

**Recommended Crops:**
- Moisture-loving vegetables (cucumbers, lettuces)
- Shrubs
- Ornamental trees
- Perennial flowers
- Most berry varieties

**Improvement Strategies:**
1. Add coarse organic matter to improve structure
2. Avoid walking on garden beds to prevent compaction
3. Use raised beds in very wet areas
4. Add limestone or gypsum to improve structure
5. Mulch to prevent crusting

**Optimal pH Range:** 6.0-7.0

**Fertilizer Recommendations:**
Usually rich in nutrients but may benefit from phosphorus additions. Conduct soil tests to determine specific needs. Avoid heavy nitrogen applications which can lead to overly lush growth susceptible to disease.";

const PEATY_REPORT: &str = "\
## Peaty Soil Analysis Report

**Soil Composition:**
Peaty soil is high in organic material and typically found in historically water-logged areas. It tends to be darker in color and very lightweight when dry.

**Key Characteristics:**
- High water retention
- Slow to warm in spring
- Acidic pH
- Low in some nutrients despite high organic content
- Low density

**Recommended Crops:**
- Acid-loving plants (blueberries, rhododendrons)
- Moisture-loving vegetables
- Leafy greens
- Brassicas
- Some root crops

**Improvement Strategies:**
1. Add lime to reduce acidity if needed
2. Improve drainage for many crops
3. Add balanced minerals and nutrients
4. Consider raised beds for better drainage
5. Add clay or sand to improve structure in some cases

**Optimal pH Range:** 5.0-6.0 (naturally acidic)

**Fertilizer Recommendations:**
Often requires additional phosphorus, potassium, and trace minerals. Use fertilizers formulated for acid-loving plants when appropriate. May need copper supplements as this is often deficient in peaty soils.";

const CHALKY_REPORT: &str = "\
## Chalky Soil Analysis Report

**Soil Composition:**
Chalky soil contains limestone and typically has many small stones throughout. It tends to be light in color and alkaline in pH.

**Key Characteristics:**
- Free-draining
- Shallow
- Stony
- Alkaline pH
- Warms quickly in spring
- Often lacks nutrients

**Recommended Crops:**
- Mediterranean herbs
- Lavender and similar plants
- Spinach and some brassicas
- Plants that prefer alkaline conditions
- Drought-resistant varieties

**Improvement Strategies:**
1. Add humus-rich organic matter regularly
2. Use acidic composts for acid-loving plants
3. Add iron supplements for plants showing yellowing leaves
4. Mulch to improve water retention
5. Consider container gardening for acid-loving plants

**Optimal pH Range:** 7.0-8.0 (naturally alkaline)

**Fertilizer Recommendations:**
Use fertilizers containing chelated minerals which remain available in alkaline soils. Plants may need additional iron, manganese, and boron. Consider specialized fertilizers designed for alkaline conditions.";

/// Deterministic generator backed by the authored report table. Performs no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticReportGenerator;

impl StaticReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Authored text for a known soil type.
    pub fn report(soil_type: SoilType) -> &'static str {
        match soil_type {
            SoilType::Clay => CLAY_REPORT,
            SoilType::Sandy => SANDY_REPORT,
            SoilType::Loam => LOAM_REPORT,
            SoilType::Silt => SILT_REPORT,
            SoilType::Peaty => PEATY_REPORT,
            SoilType::Chalky => CHALKY_REPORT,
        }
    }

    /// Looks up any raw soil-type string, falling back to [`FALLBACK_REPORT`].
    pub fn report_for(soil_type: &str) -> &'static str {
        soil_type
            .parse::<SoilType>()
            .map(Self::report)
            .unwrap_or(FALLBACK_REPORT)
    }
}

#[async_trait]
impl ReportGenerator for StaticReportGenerator {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn generate(&self, request: &ReportRequest) -> GenerationResult<NonEmptyText> {
        NonEmptyText::new(Self::report(request.soil_type))
            .map_err(|_| GenerationError::MalformedResponse)
    }
}
