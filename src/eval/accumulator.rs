//! Cache de avaliação por posição e o histórico de estados que o possui.

/// Score de avaliação em unidades internas.
pub type Value = i32;

/// Índice de uma feature ativa, como entendido pelo estágio de transformação.
pub type FeatureIndex = u32;

/// Lado a jogar, e a perspectiva de onde um conjunto de features é visto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn flip(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Features que saíram e entraram numa transição, por perspectiva.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureDelta {
    removed: [Vec<FeatureIndex>; 2],
    added: [Vec<FeatureIndex>; 2],
}

impl FeatureDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, perspective: Color, feature: FeatureIndex) -> &mut Self {
        self.removed[perspective.index()].push(feature);
        self
    }

    pub fn add(&mut self, perspective: Color, feature: FeatureIndex) -> &mut Self {
        self.added[perspective.index()].push(feature);
        self
    }

    pub fn removed(&self, perspective: Color) -> &[FeatureIndex] {
        &self.removed[perspective.index()]
    }

    pub fn added(&self, perspective: Color) -> &[FeatureIndex] {
        &self.added[perspective.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.removed.iter().chain(self.added.iter()).all(Vec::is_empty)
    }
}

/// Como um nó de estado foi alcançado a partir do pai.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Primeiro nó do histórico; não há pai.
    Root,
    /// O estágio de transformação não consegue derivar este nó do pai.
    Refresh,
    /// A acumulação do pai mais este delta dá a deste nó.
    Incremental(FeatureDelta),
}

/// Último score calculado de um nó.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachedScore {
    #[default]
    Invalid,
    Valid(Value),
}

/// Entrada de cache ligada a um nó de estado.
///
/// Guarda a acumulação do estágio de transformação (quando calculada) e o
/// último score propagado. Nasce inválida; pertence a exatamente um nó.
#[derive(Debug, Clone, Default)]
pub struct AccumulatorCache {
    accumulation: Option<[Vec<i16>; 2]>,
    score: CachedScore,
}

impl AccumulatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifica se há um score guardado que pode ser devolvido como está.
    pub fn is_valid(&self) -> bool {
        matches!(self.score, CachedScore::Valid(_))
    }

    pub fn score(&self) -> Option<Value> {
        match self.score {
            CachedScore::Valid(v) => Some(v),
            CachedScore::Invalid => None,
        }
    }

    pub fn cached_score(&self) -> CachedScore {
        self.score
    }

    pub fn store_score(&mut self, score: Value) {
        self.score = CachedScore::Valid(score);
    }

    pub fn has_accumulation(&self) -> bool {
        self.accumulation.is_some()
    }

    /// Acumulação por perspectiva, indexada por [`Color::index`].
    pub fn accumulation(&self) -> Option<&[Vec<i16>; 2]> {
        self.accumulation.as_ref()
    }

    pub fn set_accumulation(&mut self, accumulation: [Vec<i16>; 2]) {
        self.accumulation = Some(accumulation);
    }

    /// Descarta score e acumulação, forçando um refresh completo.
    pub fn invalidate(&mut self) {
        self.accumulation = None;
        self.score = CachedScore::Invalid;
    }
}

/// Uma entrada do histórico de estados.
#[derive(Debug, Clone)]
pub struct StateNode {
    change: StateChange,
    cache: AccumulatorCache,
}

impl StateNode {
    fn new(change: StateChange) -> Self {
        Self {
            change,
            cache: AccumulatorCache::new(),
        }
    }

    pub fn change(&self) -> &StateChange {
        &self.change
    }

    pub fn cache(&self) -> &AccumulatorCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut AccumulatorCache {
        &mut self.cache
    }
}

/// Pilha de estados percorrida por uma thread de busca.
///
/// Sempre contém ao menos o nó raiz. Cada push cria uma entrada nova e
/// inválida; o pop de um nó destrói a sua entrada.
///
/// Todas as entradas pertencem à mesma geração de modelo; ao adotar outra
/// geração o histórico inteiro é invalidado.
#[derive(Debug, Clone)]
pub struct StateHistory {
    nodes: Vec<StateNode>,
    generation: u64,
}

impl StateHistory {
    pub fn new() -> Self {
        Self {
            nodes: vec![StateNode::new(StateChange::Root)],
            generation: 0,
        }
    }

    /// Empilha o nó alcançado por `change`.
    pub fn push(&mut self, change: StateChange) {
        self.nodes.push(StateNode::new(change));
    }

    /// Desempilha o nó atual. A raiz nunca é desempilhada.
    pub fn pop(&mut self) -> Option<StateNode> {
        if self.nodes.len() > 1 {
            self.nodes.pop()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Sempre falso; existe por simetria com `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn current(&self) -> &StateNode {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut StateNode {
        let top = self.nodes.len() - 1;
        &mut self.nodes[top]
    }

    pub fn node(&self, index: usize) -> Option<&StateNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut StateNode> {
        self.nodes.get_mut(index)
    }

    /// Índice do nó mais próximo (incluindo o atual) com acumulação,
    /// alcançável apenas por transições incrementais.
    pub fn nearest_computed(&self) -> Option<usize> {
        let mut index = self.nodes.len() - 1;
        loop {
            let node = &self.nodes[index];
            if node.cache.has_accumulation() {
                return Some(index);
            }
            match node.change {
                StateChange::Incremental(_) if index > 0 => index -= 1,
                _ => return None,
            }
        }
    }

    /// Invalida todas as entradas de cache.
    pub fn invalidate_all(&mut self) {
        for node in &mut self.nodes {
            node.cache.invalidate();
        }
    }

    /// Geração de modelo sob a qual as entradas atuais foram calculadas.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Passa a calcular sob `generation`.
    ///
    /// Se a geração mudou, todas as entradas são invalidadas e true é
    /// devolvido.
    pub fn adopt_generation(&mut self, generation: u64) -> bool {
        if self.generation == generation {
            return false;
        }
        self.invalidate_all();
        self.generation = generation;
        true
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// O que o avaliador precisa da representação de posição do host.
pub trait Position {
    fn side_to_move(&self) -> Color;

    /// Acrescenta a `out` as features ativas vistas de `perspective`.
    ///
    /// Todo índice devolvido aqui, ou registrado num [`FeatureDelta`], deve
    /// ser menor que a dimensão de entrada do estágio de transformação; um
    /// índice fora do intervalo causa panic.
    fn active_features(&self, perspective: Color, out: &mut Vec<FeatureIndex>);

    fn states(&self) -> &StateHistory;

    fn states_mut(&mut self) -> &mut StateHistory;
}
