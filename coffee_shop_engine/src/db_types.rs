use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::traits::DrinkApiError;

//--------------------------------------     Ingredient       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// The colour used when rendering this ingredient's share of the cup
    pub color: String,
    pub parts: u32,
}

impl Ingredient {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, color: S2, parts: u32) -> Self {
        Self { name: name.into(), color: color.into(), parts }
    }
}

/// The public projection of an [`Ingredient`]. The ingredient name is withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

impl From<&Ingredient> for ShortIngredient {
    fn from(value: &Ingredient) -> Self {
        Self { color: value.color.clone(), parts: value.parts }
    }
}

//--------------------------------------       Recipe         --------------------------------------------------------
/// An ordered list of ingredients.
///
/// For compatibility with older clients, a single ingredient object is accepted wherever a recipe is expected and is
/// treated as a one-element recipe. Recipes are always serialized as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Recipe(pub Vec<Ingredient>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeRepr {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl<'de> Deserialize<'de> for Recipe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let recipe = match RecipeRepr::deserialize(deserializer)? {
            RecipeRepr::Many(ingredients) => Self(ingredients),
            RecipeRepr::One(ingredient) => Self(vec![ingredient]),
        };
        Ok(recipe)
    }
}

impl From<Vec<Ingredient>> for Recipe {
    fn from(value: Vec<Ingredient>) -> Self {
        Self(value)
    }
}

impl Recipe {
    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }

    pub fn to_json(&self) -> Result<String, DrinkApiError> {
        serde_json::to_string(self).map_err(|e| DrinkApiError::ValidationError(format!("Recipe is not serializable. {e}")))
    }

    pub fn validate(&self) -> Result<(), DrinkApiError> {
        if self.0.is_empty() {
            return Err(DrinkApiError::ValidationError("A recipe needs at least one ingredient".into()));
        }
        if let Some(i) = self.0.iter().find(|i| i.parts == 0) {
            return Err(DrinkApiError::ValidationError(format!("Ingredient '{}' must have at least one part", i.name)));
        }
        Ok(())
    }
}

//--------------------------------------        Drink         --------------------------------------------------------
/// A drink on the menu. This is also the full ("long") representation that is returned to authorised callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Recipe,
}

impl Drink {
    /// The public representation of the drink, without ingredient names
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.ingredients().iter().map(ShortIngredient::from).collect(),
        }
    }

    pub fn long(&self) -> Drink {
        self.clone()
    }
}

impl Display for Drink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({} ingredients)", self.id, self.title, self.recipe.0.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// A drink exactly as it is stored. The recipe is still in its serialized form.
#[derive(Debug, Clone, FromRow)]
pub struct DrinkRow {
    pub id: i64,
    pub title: String,
    pub recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = DrinkApiError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        let recipe = serde_json::from_str::<Recipe>(&row.recipe)
            .map_err(|e| DrinkApiError::CorruptRecipe { id: row.id, reason: e.to_string() })?;
        Ok(Self { id: row.id, title: row.title, recipe })
    }
}

//--------------------------------------       NewDrink       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Recipe,
}

impl NewDrink {
    pub fn new<S: Into<String>>(title: S, recipe: Vec<Ingredient>) -> Self {
        Self { title: title.into(), recipe: Recipe(recipe) }
    }

    pub fn validate(&self) -> Result<(), DrinkApiError> {
        validate_title(&self.title)?;
        self.recipe.validate()
    }
}

//--------------------------------------      DrinkUpdate     --------------------------------------------------------
/// A partial update to a drink. Fields that are `None` keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<Recipe>,
}

impl DrinkUpdate {
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_recipe(mut self, recipe: Vec<Ingredient>) -> Self {
        self.recipe = Some(Recipe(recipe));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.recipe.is_none()
    }

    pub fn validate(&self) -> Result<(), DrinkApiError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(recipe) = &self.recipe {
            recipe.validate()?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), DrinkApiError> {
    if title.trim().is_empty() {
        Err(DrinkApiError::ValidationError("The drink title cannot be empty".into()))
    } else {
        Ok(())
    }
}
